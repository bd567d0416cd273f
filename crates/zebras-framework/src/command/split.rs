/// Shell-like splitting of slash command text.
///
/// - whitespace separates arguments
/// - a single or double quote groups only when it opens an argument or a
///   `key:` value (`phrase:"hello world"` yields `phrase:hello world`);
///   anywhere else it is literal, so `phrase:what's` stays `phrase:what's`
/// - inside double quotes `\"` and `\\` are escapes; every other backslash is
///   kept, so regex phrases such as `"\d+"` survive
pub fn shell_split(input: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if let Some(open) = quote {
            if ch == open {
                quote = None;
            } else if ch == '\\' && open == '"' {
                current.push(chars.next_if(|c| matches!(c, '"' | '\\')).unwrap_or('\\'));
            } else {
                current.push(ch);
            }
            continue;
        }

        match ch {
            '"' | '\'' if current.is_empty() || current.ends_with(':') => quote = Some(ch),
            c if c.is_whitespace() => {
                if !current.is_empty() {
                    args.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }

    if !current.is_empty() {
        args.push(current);
    }

    args
}
