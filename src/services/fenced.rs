//! Fenced code block extraction.
//!
//! Assistant replies are free-form markdown; the fix flow needs the proposed
//! code pulled out of them. This is a line-oriented parser with a fixed
//! grammar rather than ad hoc string matching: an opening line beginning
//! with ``` carrying an optional language tag (the first word of the rest of
//! that line), content lines taken verbatim, and a closing line that trims
//! to exactly ```. An unterminated fence is not a block. Only the first
//! complete block is extracted; everything outside it is prose.

/// The first complete fenced block of a reply, plus the surrounding prose
/// with the fence delimiter lines removed.
#[derive(Debug, Clone, PartialEq)]
pub struct CodeBlock {
    pub language: Option<String>,
    pub code: String,
    pub prose: String,
}

#[derive(Clone, Copy)]
enum Scan {
    Prose,
    Code,
    Tail,
}

/// Returns `Some` when the reply contains a complete fenced block, `None`
/// otherwise. `code` is the inner text with surrounding whitespace trimmed.
pub fn extract_code_block(reply: &str) -> Option<CodeBlock> {
    let mut language = None;
    let mut code_lines: Vec<&str> = Vec::new();
    let mut prose_lines: Vec<&str> = Vec::new();
    let mut state = Scan::Prose;

    for line in reply.lines() {
        match state {
            Scan::Prose => {
                if let Some(info) = line.trim_start().strip_prefix("```") {
                    language = info.split_whitespace().next().map(str::to_string);
                    state = Scan::Code;
                } else {
                    prose_lines.push(line);
                }
            }
            Scan::Code => {
                if line.trim() == "```" {
                    state = Scan::Tail;
                } else {
                    code_lines.push(line);
                }
            }
            Scan::Tail => prose_lines.push(line),
        }
    }

    match state {
        Scan::Tail => Some(CodeBlock {
            language,
            code: code_lines.join("\n").trim().to_string(),
            prose: prose_lines.join("\n").trim().to_string(),
        }),
        // No fence at all, or an opening fence that never closed.
        Scan::Prose | Scan::Code => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_block_with_language_tag() {
        let reply = "Here is the fix:\n```cpp\nint main() { return 0; }\n```\nHope that helps.";
        let block = extract_code_block(reply).unwrap();
        assert_eq!(block.language.as_deref(), Some("cpp"));
        assert_eq!(block.code, "int main() { return 0; }");
        assert_eq!(block.prose, "Here is the fix:\nHope that helps.");
    }

    #[test]
    fn test_extracts_block_without_tag() {
        let reply = "```\nx = 1;\n```";
        let block = extract_code_block(reply).unwrap();
        assert_eq!(block.language, None);
        assert_eq!(block.code, "x = 1;");
        assert_eq!(block.prose, "");
    }

    #[test]
    fn test_no_fence_returns_none() {
        assert!(extract_code_block("just prose, no code").is_none());
    }

    #[test]
    fn test_unterminated_fence_returns_none() {
        assert!(extract_code_block("intro\n```cpp\nint x = 1;").is_none());
    }

    #[test]
    fn test_prose_excludes_delimiters() {
        let reply = "before\n```cpp\ncode\n```\nafter";
        let block = extract_code_block(reply).unwrap();
        assert!(!block.prose.contains("```"));
        assert_eq!(block.prose, "before\nafter");
    }

    #[test]
    fn test_inner_whitespace_is_trimmed() {
        let reply = "```\n\n  int y = 2;\n\n```";
        let block = extract_code_block(reply).unwrap();
        assert_eq!(block.code, "int y = 2;");
    }

    #[test]
    fn test_first_complete_block_wins() {
        let reply = "```cpp\nfirst\n```\ntext\n```cpp\nsecond\n```";
        let block = extract_code_block(reply).unwrap();
        assert_eq!(block.code, "first");
        assert!(block.prose.contains("second"));
    }

    #[test]
    fn test_language_tag_is_first_word_of_info_string() {
        let reply = "```cpp fixed version\ncode\n```";
        let block = extract_code_block(reply).unwrap();
        assert_eq!(block.language.as_deref(), Some("cpp"));
    }

    #[test]
    fn test_indented_fence_opens_a_block() {
        let reply = "  ```cpp\ncode\n  ```";
        let block = extract_code_block(reply).unwrap();
        assert_eq!(block.code, "code");
    }
}
