//! Fixed-width text output
//!
//! Every explanation line leaving the engine is at most [`DISPLAY_WIDTH`]
//! characters. Lines are word-wrapped; only a single word longer than the
//! width is split mid-word.

/// Character columns of the operator display
pub const DISPLAY_WIDTH: usize = 38;

/// Wrap each line to `width` characters, preserving line order
pub fn wrap_lines<I, S>(lines: I, width: usize) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let width = width.max(1);
    let mut out = Vec::new();
    for line in lines {
        wrap_line(line.as_ref(), width, &mut out);
    }
    out
}

fn wrap_line(line: &str, width: usize, out: &mut Vec<String>) {
    let line = line.trim_end();
    if line.chars().count() <= width {
        out.push(line.to_string());
        return;
    }

    let body = line.trim_start();
    let indent = &line[..line.len() - body.len()];
    let mut current = if indent.chars().count() < width {
        indent.to_string()
    } else {
        String::new()
    };
    let mut current_len = current.chars().count();
    let mut has_word = false;

    for word in body.split_whitespace() {
        let word_len = word.chars().count();
        let needed = if has_word { word_len + 1 } else { word_len };

        if current_len + needed <= width {
            if has_word {
                current.push(' ');
            }
            current.push_str(word);
            current_len += needed;
            has_word = true;
            continue;
        }

        if has_word {
            out.push(std::mem::take(&mut current));
            current_len = 0;
            has_word = false;
        }

        if word_len <= width - current_len {
            current.push_str(word);
            current_len += word_len;
            has_word = true;
            continue;
        }

        // Over-long word: hard split, first chunk after any indent
        let chars: Vec<char> = word.chars().collect();
        let mut rest = chars.as_slice();
        loop {
            let take = (width - current_len).min(rest.len());
            current.extend(&rest[..take]);
            current_len += take;
            rest = &rest[take..];
            if rest.is_empty() {
                break;
            }
            out.push(std::mem::take(&mut current));
            current_len = 0;
        }
        has_word = true;
    }

    if has_word || !current.is_empty() {
        out.push(current);
    }
}
