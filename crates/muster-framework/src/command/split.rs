/// Splits command text into tokens.
///
/// Rules:
/// - Unquoted whitespace separates tokens; runs of it never yield empty
///   tokens.
/// - A double quote toggles quoting and is dropped. Quoted whitespace is
///   kept inside the token, and `""` yields an empty token.
/// - An unterminated quote runs to the end of the input, so the remainder
///   becomes the final token.
pub fn tokenize(input: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    // Set once the current token has seen a quote, so `""` survives.
    let mut quoted = false;

    for ch in input.chars() {
        match ch {
            '"' => {
                in_quotes = !in_quotes;
                quoted = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if !current.is_empty() || quoted {
                    tokens.push(std::mem::take(&mut current));
                }
                quoted = false;
            }
            _ => current.push(ch),
        }
    }

    if !current.is_empty() || quoted {
        tokens.push(current);
    }

    tokens
}
