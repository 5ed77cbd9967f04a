/// Item name as a KittyKeys token: lowercase, `_`-separated, limited to
/// ASCII letters, digits and parentheses. `"Karil's coif"` becomes
/// `"karil_s_coif"` and `"Super restore(4)"` becomes `"super_restore_(4)"`.
///
/// Applying it twice gives the same result as applying it once.
pub fn sanitize_kittykeys_name(name: &str) -> String {
    let straightened = name.replace('\u{2019}', "'");

    let mut separated = String::with_capacity(straightened.len() + 4);
    let mut previous: Option<char> = None;
    for c in straightened.chars() {
        if c == '(' && previous.is_some_and(|p| !p.is_whitespace() && p != '_') {
            separated.push('_');
        }
        separated.push(c);
        previous = Some(c);
    }

    let restricted: String = separated
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '(' || c == ')' || c == ' ' {
                c
            } else {
                ' '
            }
        })
        .collect();

    let joined = restricted.split_whitespace().collect::<Vec<_>>().join("_");

    let mut collapsed = String::with_capacity(joined.len());
    for c in joined.chars() {
        if c == '_' && collapsed.ends_with('_') {
            continue;
        }
        collapsed.push(c);
    }

    collapsed.trim_matches('_').to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::sanitize_kittykeys_name;

    #[test]
    fn examples() {
        assert_eq!(sanitize_kittykeys_name("Karil\u{2019}s coif"), "karil_s_coif");
        assert_eq!(sanitize_kittykeys_name("Super restore(4)"), "super_restore_(4)");
        assert_eq!(sanitize_kittykeys_name("Saradomin brew (3)"), "saradomin_brew_(3)");
        assert_eq!(sanitize_kittykeys_name("  Rune   platebody  "), "rune_platebody");
        assert_eq!(sanitize_kittykeys_name("Ava's accumulator"), "ava_s_accumulator");
        assert_eq!(sanitize_kittykeys_name("Dragon dagger(p++)"), "dragon_dagger_(p_)");
        assert_eq!(sanitize_kittykeys_name("___"), "");
        assert_eq!(sanitize_kittykeys_name(""), "");
    }

    #[test]
    fn sanitizing_is_idempotent() {
        let inputs = [
            "Karil\u{2019}s coif",
            "Super restore(4)",
            "a()",
            "(leading paren",
            "x_(y)",
            "Tab\tseparated\nname",
            "Ünïcödé sword",
            "__weird__ ((name)) __",
            "Dragon dagger(p++)",
            "1-2-3",
        ];
        for input in inputs {
            let once = sanitize_kittykeys_name(input);
            assert_eq!(sanitize_kittykeys_name(&once), once, "input {input:?}");
        }
    }
}
