/// Normalizes a user-typed phone number to `+<digits>`.
///
/// Everything but digits and `+` is dropped first; a `+` only counts when it
/// leads what is left, so `(+27) 71 ...` keeps its country code. Numbers
/// without a country code get `default_country_code`, after any trunk `0` is
/// removed. A `00` international prefix is read as `+`.
/// Returns `None` when no digits are left.
pub fn normalize_phone(raw: &str, default_country_code: &str) -> Option<String> {
    let stripped: String = raw.chars().filter(|c| c.is_ascii_digit() || *c == '+').collect();
    let has_plus = stripped.starts_with('+');
    let digits: String = stripped.chars().filter(|c| c.is_ascii_digit()).collect();

    if has_plus {
        return (!digits.is_empty()).then(|| format!("+{}", digits));
    }

    if let Some(international) = digits.strip_prefix("00") {
        let international = international.trim_start_matches('0');
        return (!international.is_empty()).then(|| format!("+{}", international));
    }

    let national = digits.trim_start_matches('0');
    if national.is_empty() {
        return None;
    }

    let country: String = default_country_code.chars().filter(|c| c.is_ascii_digit()).collect();
    Some(format!("+{}{}", country, national))
}
