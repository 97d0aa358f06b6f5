/// One word of a line of g-code, e.g. `X-5`, `G38.2`, `X#<x>` or `Z[#<_abs_z>]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Word<'a> {
    pub head: char,
    pub value: &'a str,
}

/// Index one past the `]` closing the `[` that starts `input`.
pub(crate) fn closing_bracket(input: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (index, c) in input.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(index + 1);
                }
            }
            _ => (),
        }
    }
    None
}

// input should be trimmed.
fn parse_word(input: &str) -> Option<(&str, Word<'_>)> {
    let head = input.chars().next().filter(char::is_ascii_alphabetic)?;
    let input = input[1..].trim_start();
    let end = if input.starts_with('[') {
        closing_bracket(input)?
    } else if input.starts_with("#<") {
        input.find('>')? + 1
    } else if let Some(rest) = input.strip_prefix('#') {
        1 + rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len())
    } else {
        input
            .find(|c: char| !c.is_ascii_digit() && c != '.' && c != '-' && c != '+')
            .unwrap_or(input.len())
    };
    Some((
        &input[end..],
        Word {
            head: head.to_ascii_uppercase(),
            value: &input[..end],
        },
    ))
}

pub fn parse_words(mut input: &str) -> Option<Vec<Word<'_>>> {
    let mut words = Vec::new();
    loop {
        input = input.trim_start();
        if input.is_empty() {
            return Some(words);
        }
        let (rest, word) = parse_word(input)?;
        words.push(word);
        input = rest;
    }
}

/// A line setting a named parameter, `#<name> = value`.
pub fn parse_assignment(line: &str) -> Option<(&str, &str)> {
    let rest = line.strip_prefix("#<")?;
    let (name, rest) = rest.split_once('>')?;
    let value = rest.trim_start().strip_prefix('=')?;
    Some((name, value.trim()))
}

#[cfg(test)]
pub mod test {
    use super::*;

    #[test]
    pub fn test_words() {
        let words = parse_words("G90 G1 X#<x> F1000").unwrap();
        let heads: Vec<(char, &str)> = words.iter().map(|w| (w.head, w.value)).collect();
        assert_eq!(heads, vec![('G', "90"), ('G', "1"), ('X', "#<x>"), ('F', "1000")]);

        let words = parse_words("G10 L1 P#5400 Z[#5063 + #<zworkoffset> - -60]").unwrap();
        assert_eq!(words[2], Word { head: 'P', value: "#5400" });
        assert_eq!(words[3], Word { head: 'Z', value: "[#5063 + #<zworkoffset> - -60]" });

        let words = parse_words("G38.2X-2.4F10").unwrap();
        assert_eq!(words, vec![
            Word { head: 'G', value: "38.2" },
            Word { head: 'X', value: "-2.4" },
            Word { head: 'F', value: "10" },
        ]);
        let words = parse_words("G1 Z[#[5203 + #5220 * 20] + 1] F5").unwrap();
        assert_eq!(words[1].value, "[#[5203 + #5220 * 20] + 1]");
        assert_eq!(words[2], Word { head: 'F', value: "5" });
        assert_eq!(parse_words("G4 p 5").unwrap()[1], Word { head: 'P', value: "5" });
        assert_eq!(parse_words("G1 X[1"), None);
    }

    #[test]
    pub fn test_assignment() {
        assert_eq!(parse_assignment("#<x> = #<_x>"), Some(("x", "#<_x>")));
        assert_eq!(parse_assignment("#<touch_result> = #5063"), Some(("touch_result", "#5063")));
        assert_eq!(parse_assignment("G1 X0"), None);
    }
}
