use unicode_segmentation::UnicodeSegmentation;

use crate::analysis::token::Token;

/// Analyzers are substitutable as long as the writer and the query side
/// produce the same term bytes for the same input.
pub trait Tokenizer: Send + Sync {
    fn tokenize(&self, input: &[u8]) -> Vec<Token>;

    fn name(&self) -> &str;
}

/// Standard Unicode tokenizer: lowercases, then splits on word boundaries.
#[derive(Clone)]
pub struct StandardTokenizer {
    pub lowercase: bool,
    pub max_token_length: usize,
}

impl Default for StandardTokenizer {
    fn default() -> Self {
        StandardTokenizer {
            lowercase: true,
            max_token_length: 255,
        }
    }
}

impl Tokenizer for StandardTokenizer {
    fn tokenize(&self, input: &[u8]) -> Vec<Token> {
        let text = String::from_utf8_lossy(input);
        let text = if self.lowercase {
            text.to_lowercase()
        } else {
            text.into_owned()
        };

        let mut tokens = Vec::new();
        let mut position = 0u32;

        for word in text.unicode_words() {
            if word.len() <= self.max_token_length {
                tokens.push(Token::new(word.to_string(), position));
                position += 1;
            }
        }

        tokens
    }

    fn name(&self) -> &str {
        "standard"
    }
}
