/// Normalizes a submitted text field by stripping surrounding
/// whitespace and decomposing it into Unicode Normalization Form D.
///
/// ```
/// use doctor_registry::normalization::normalize_text;
/// assert_eq!(normalize_text("  Dr. Asha Rao  "), "Dr. Asha Rao");
/// ```
pub fn normalize_text(value: impl AsRef<str>) -> String {
    use unicode_normalization::UnicodeNormalization;

    value.as_ref().trim().nfd().to_string()
}
