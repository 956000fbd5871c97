//! Default table and column naming.
//!
//! Type and field names are normalized to UPPER_SNAKE_CASE: `TesterItem`
//! becomes `TESTER_ITEM`, `createdAt` and `created_at` become `CREATED_AT`.

/// Convert string to snake_case
///
/// A run of capitals is treated as one word (`HTTPServer` → `http_server`).
pub fn snake_case(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut result = String::with_capacity(s.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() {
            let prev = i.checked_sub(1).map(|p| chars[p]);
            let next = chars.get(i + 1).copied();
            let starts_word = match prev {
                None | Some('_') => false,
                Some(p) if p.is_lowercase() || p.is_ascii_digit() => true,
                Some(p) if p.is_uppercase() => next.is_some_and(|n| n.is_lowercase()),
                Some(_) => false,
            };
            if starts_word {
                result.push('_');
            }
            result.extend(c.to_lowercase());
        } else {
            result.push(c);
        }
    }
    result
}

/// Default table name for an entity type name
pub fn table_name_for(type_name: &str) -> String {
    snake_case(type_name).to_uppercase()
}

/// Default column name for a field name
pub fn column_name_for(field_name: &str) -> String {
    snake_case(field_name.trim_start_matches("r#")).to_uppercase()
}
