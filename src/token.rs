//! Tokenized source representation.

use std::fmt;

/// Semantic tag carried by a highlighted fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Comment,
    String,
    Number,
    Keyword,
    Function,
    Parameter,
    Variable,
    Operator,
    Punctuation,
    Boolean,
    Constant,
    Macro,
    Property,
    TemplateString,
    Interpolation,
}

impl Category {
    pub fn name(self) -> &'static str {
        match self {
            Category::Comment => "comment",
            Category::String => "string",
            Category::Number => "number",
            Category::Keyword => "keyword",
            Category::Function => "function",
            Category::Parameter => "parameter",
            Category::Variable => "variable",
            Category::Operator => "operator",
            Category::Punctuation => "punctuation",
            Category::Boolean => "boolean",
            Category::Constant => "constant",
            Category::Macro => "macro",
            Category::Property => "property",
            Category::TemplateString => "template-string",
            Category::Interpolation => "interpolation",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Untagged source text.
    Leaf(String),
    /// Tagged fragment wrapping a single nested token.
    Node { category: Category, content: Box<Token> },
    /// Tagged fragment wrapping an ordered sequence of tokens.
    NodeList { category: Category, content: Vec<Token> },
}

impl Token {
    pub fn leaf(text: impl Into<String>) -> Self {
        Token::Leaf(text.into())
    }

    pub fn node(category: Category, text: impl Into<String>) -> Self {
        Token::Node { category, content: Box::new(Token::Leaf(text.into())) }
    }

    /// `None` for raw leaves.
    pub fn category(&self) -> Option<Category> {
        match self {
            Token::Leaf(_) => None,
            Token::Node { category, .. } | Token::NodeList { category, .. } => Some(*category),
        }
    }

    /// Concatenated leaf text, in order.
    pub fn flatten(&self) -> String {
        let mut out = String::new();
        self.flatten_into(&mut out);
        out
    }

    pub fn flatten_into(&self, out: &mut String) {
        match self {
            Token::Leaf(text) => out.push_str(text),
            Token::Node { content, .. } => content.flatten_into(out),
            Token::NodeList { content, .. } => {
                for token in content {
                    token.flatten_into(out);
                }
            }
        }
    }
}

/// Flatten a whole token stream back to source text.
pub fn flatten_all(tokens: &[Token]) -> String {
    let mut out = String::new();
    for token in tokens {
        token.flatten_into(&mut out);
    }
    out
}
