//! Built-in syntax tokenizer.
//!
//! A [`Grammar`] is an ordered list of rules, each a regex tagged with a [`Category`].
//! Scanning picks, at every position, the rule whose match starts earliest (ties go to
//! the rule listed first). Text no rule claims becomes a plain [`Token::Leaf`]. A rule may
//! carry an inside grammar, in which case its match is tokenized again and emitted as a
//! [`Token::NodeList`].
//!
//! The `regex` crate has no lookaround, so rules that need trailing context (a call's
//! opening paren, a JSON key's colon) match it and mark the token text with a capture
//! group; only the group is consumed.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::RenderError;
use crate::token::{Category, Token};

const MAX_NESTING: usize = 8;

pub struct Rule {
    category: Category,
    pattern: Regex,
    group: usize,
    inside: Option<Grammar>,
}

impl Rule {
    pub fn new(category: Category, pattern: &str) -> Result<Self, regex::Error> {
        Ok(Rule { category, pattern: Regex::new(pattern)?, group: 0, inside: None })
    }

    /// Only this capture group becomes the token; the rest of the match is context.
    pub fn group(mut self, group: usize) -> Self {
        self.group = group;
        self
    }

    pub fn inside(mut self, grammar: Grammar) -> Self {
        self.inside = Some(grammar);
        self
    }

    /// First non-empty match at or after `pos`, as a byte range.
    fn find_at(&self, text: &str, pos: usize) -> Option<(usize, usize)> {
        let mut search = pos;
        while search <= text.len() {
            let caps = self.pattern.captures_at(text, search)?;
            if let Some(m) = caps.get(self.group) {
                if !m.is_empty() {
                    return Some((m.start(), m.end()));
                }
            }
            let whole = caps.get(0)?;
            let step = text[whole.start()..].chars().next().map_or(1, char::len_utf8);
            search = whole.start() + step;
        }
        None
    }
}

pub struct Grammar {
    name: &'static str,
    rules: Vec<Rule>,
}

impl Grammar {
    pub fn new(name: &'static str, rules: Vec<Rule>) -> Self {
        Grammar { name, rules }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Tokenize one line of source. Flattening the result reproduces `text` exactly.
    pub fn tokenize(&self, text: &str) -> Result<Vec<Token>, RenderError> {
        self.tokenize_at_depth(text, 0)
    }

    fn tokenize_at_depth(&self, text: &str, depth: usize) -> Result<Vec<Token>, RenderError> {
        if depth > MAX_NESTING {
            return Err(RenderError::Tokenize(format!(
                "{} grammar nested deeper than {MAX_NESTING} levels",
                self.name
            )));
        }

        let mut tokens = Vec::new();
        let mut pos = 0;
        while pos < text.len() {
            let Some((rule, start, end)) = self.next_match(text, pos) else {
                break;
            };
            if start > pos {
                tokens.push(Token::leaf(&text[pos..start]));
            }
            let fragment = &text[start..end];
            tokens.push(match &rule.inside {
                Some(inner) => Token::NodeList {
                    category: rule.category,
                    content: inner.tokenize_at_depth(fragment, depth + 1)?,
                },
                None => Token::node(rule.category, fragment),
            });
            pos = end;
        }
        if pos < text.len() {
            tokens.push(Token::leaf(&text[pos..]));
        }
        Ok(tokens)
    }

    fn next_match(&self, text: &str, pos: usize) -> Option<(&Rule, usize, usize)> {
        let mut best: Option<(&Rule, usize, usize)> = None;
        for rule in &self.rules {
            let Some((start, end)) = rule.find_at(text, pos) else {
                continue;
            };
            if best.map_or(true, |(_, best_start, _)| start < best_start) {
                best = Some((rule, start, end));
            }
        }
        best
    }
}

/// Language identifier -> grammar lookup. Identifiers are case-insensitive.
#[derive(Default)]
pub struct LanguageRegistry {
    grammars: Vec<Grammar>,
    aliases: HashMap<String, usize>,
}

impl LanguageRegistry {
    pub fn new() -> Self {
        LanguageRegistry::default()
    }

    /// Shared registry of the built-in languages, compiled on first use.
    pub fn builtin() -> &'static LanguageRegistry {
        static BUILTIN: OnceLock<LanguageRegistry> = OnceLock::new();
        BUILTIN.get_or_init(|| {
            let mut registry = LanguageRegistry::new();
            registry.register(javascript(), &["javascript", "js", "jsx", "mjs"]);
            registry.register(typescript(), &["typescript", "ts", "tsx"]);
            registry.register(python(), &["python", "py"]);
            registry.register(rust(), &["rust", "rs"]);
            registry.register(bash(), &["bash", "sh", "shell", "zsh"]);
            registry.register(json(), &["json"]);
            registry.register(Grammar::new("plain", Vec::new()), &["plain", "plaintext", "text", "txt"]);
            registry
        })
    }

    pub fn register(&mut self, grammar: Grammar, aliases: &[&str]) {
        let idx = self.grammars.len();
        self.grammars.push(grammar);
        for alias in aliases {
            self.aliases.insert(alias.to_ascii_lowercase(), idx);
        }
    }

    pub fn get(&self, id: &str) -> Option<&Grammar> {
        let idx = *self.aliases.get(&id.trim().to_ascii_lowercase())?;
        self.grammars.get(idx)
    }

    pub fn supports(&self, id: &str) -> bool {
        self.get(id).is_some()
    }
}

// ── Built-in grammars ───────────────────────────────────────

/// Patterns below are constants; a failure to compile is a bug in this file.
fn rule(category: Category, pattern: &str) -> Rule {
    Rule::new(category, pattern).unwrap_or_else(|e| panic!("built-in pattern {pattern:?}: {e}"))
}

const C_COMMENT: &str = r"//.*|/\*[\s\S]*?(?:\*/|$)";

const JS_KEYWORDS: &str = "as|async|await|break|case|catch|class|const|continue|debugger|default|delete|do|else|export|extends|finally|for|from|function|get|if|import|in|instanceof|let|new|null|of|return|set|static|super|switch|this|throw|try|typeof|undefined|var|void|while|with|yield";

const TS_KEYWORDS: &str = "abstract|any|boolean|declare|enum|implements|interface|keyof|namespace|never|number|private|protected|public|readonly|string|type|unknown";

fn clike(keywords: &str) -> Vec<Rule> {
    vec![
        rule(Category::Comment, C_COMMENT),
        rule(Category::String, r#""(?:\\.|[^\\"])*"?|'(?:\\.|[^\\'])*'?"#),
        rule(Category::Keyword, &format!(r"\b(?:{keywords})\b")),
        rule(Category::Boolean, r"\b(?:true|false)\b"),
        rule(Category::Function, r"\b([A-Za-z_][\w$]*)\s*\(").group(1),
        rule(
            Category::Number,
            r"\b0[xX][\dA-Fa-f_]+n?\b|\b0[bB][01_]+n?\b|\b0[oO][0-7_]+n?\b|(?:\b\d[\d_]*(?:\.[\d_]*)?|\B\.\d[\d_]*)(?:[eE][+-]?\d+)?n?",
        ),
        rule(
            Category::Operator,
            r"--|\+\+|\*\*=?|=>|&&=?|\|\|=?|\?\?=?|[!=]==?|<<=?|>>>?=?|[-+*/%&|^!=<>]=?|\.\.\.|[~?:]",
        ),
        rule(Category::Punctuation, r"[{}\[\];(),.]"),
    ]
}

fn ecmascript(name: &'static str, keywords: &str) -> Grammar {
    let mut interpolation = vec![rule(Category::Punctuation, r"^\$\{|\}$")];
    interpolation.extend(clike(keywords));

    let template = Grammar::new(
        "template-string",
        vec![
            rule(Category::Punctuation, r"^`|`$"),
            rule(Category::Interpolation, r"\$\{[^}]*\}?").inside(Grammar::new("interpolation", interpolation)),
            rule(Category::String, r"(?:\\[\s\S]|[^\\`$]|\$(?:[^{`]|$))+"),
        ],
    );

    let mut rules = clike(keywords);
    rules.insert(1, rule(Category::TemplateString, r"`(?:\\[\s\S]|[^\\`])*`?").inside(template));
    Grammar::new(name, rules)
}

fn javascript() -> Grammar {
    ecmascript("javascript", JS_KEYWORDS)
}

fn typescript() -> Grammar {
    ecmascript("typescript", &format!("{JS_KEYWORDS}|{TS_KEYWORDS}"))
}

fn python() -> Grammar {
    Grammar::new(
        "python",
        vec![
            rule(Category::Comment, r"#.*"),
            rule(
                Category::String,
                r#"(?:\b[rRbBuUfF]{1,2})?(?:"""[\s\S]*?(?:"""|$)|'''[\s\S]*?(?:'''|$)|"(?:\\.|[^\\"])*"?|'(?:\\.|[^\\'])*'?)"#,
            ),
            rule(
                Category::Keyword,
                r"\b(?:and|as|assert|async|await|break|case|class|continue|def|del|elif|else|except|finally|for|from|global|if|import|in|is|lambda|match|nonlocal|not|or|pass|raise|return|try|while|with|yield)\b",
            ),
            rule(Category::Boolean, r"\b(?:True|False|None)\b"),
            rule(Category::Function, r"\b([A-Za-z_]\w*)\s*\(").group(1),
            rule(
                Category::Number,
                r"(?i:\b0(?:b(?:_?[01])+|o(?:_?[0-7])+|x(?:_?[a-f0-9])+)\b|(?:\b\d+(?:_\d+)*(?:\.(?:\d+(?:_\d+)*)?)?|\B\.\d+(?:_\d+)*)(?:e[+-]?\d+(?:_\d+)*)?j?)",
            ),
            rule(Category::Operator, r"[-+%=]=?|!=|:=|\*\*?=?|//?=?|<[<=>]?|>[=>]?|[&|^~]"),
            rule(Category::Punctuation, r"[{}\[\];(),.:]"),
        ],
    )
}

fn rust() -> Grammar {
    Grammar::new(
        "rust",
        vec![
            rule(Category::Comment, C_COMMENT),
            rule(
                Category::String,
                r##"b?r#*"[^"]*"?#*|b?"(?:\\[\s\S]|[^\\"])*"?|b?'(?:\\(?:x[0-7][\da-fA-F]|u\{[\da-fA-F_]{1,6}\}|.)|[^\\\r\n\t'])'"##,
            ),
            rule(
                Category::Keyword,
                r"\b(?:as|async|await|break|const|continue|crate|dyn|else|enum|extern|fn|for|if|impl|in|let|loop|match|mod|move|mut|pub|ref|return|self|Self|static|struct|super|trait|type|unsafe|use|where|while|yield)\b",
            ),
            rule(Category::Boolean, r"\b(?:true|false)\b"),
            rule(Category::Macro, r"\b([A-Za-z_]\w*!)\s*[(\[{]").group(1),
            rule(Category::Function, r"\b([a-z_]\w*)\s*\(").group(1),
            rule(
                Category::Number,
                r"\b(?:0x[\dA-Fa-f](?:_?[\dA-Fa-f])*|0o[0-7](?:_?[0-7])*|0b[01](?:_?[01])*|(?:(?:\d(?:_?\d)*)?\.)?\d(?:_?\d)*(?:[Ee][+-]?\d+)?)(?:_?(?:f32|f64|[iu](?:8|16|32|64|128|size)?))?\b",
            ),
            rule(Category::Punctuation, r"->|=>|::|\.\.=?|[{}\[\];(),:.#]"),
            rule(Category::Operator, r"[-+*/%!^]=?|=[=>]?|&[&=]?|\|[|=]?|<<?=?|>>?=?|[@?]"),
        ],
    )
}

const SHELL_VARIABLE: &str = r"\$\{[^}]*\}?|\$(?:\w+|[!@#$*?\-])";

fn bash() -> Grammar {
    let quoted = Grammar::new("bash-string", vec![rule(Category::Variable, SHELL_VARIABLE)]);
    Grammar::new(
        "bash",
        vec![
            rule(Category::Comment, r"(?:^|\s)(#.*)").group(1),
            rule(Category::String, r#""(?:\\[\s\S]|[^\\"])*"?"#).inside(quoted),
            rule(Category::String, r"'[^']*'?"),
            rule(Category::Variable, SHELL_VARIABLE),
            rule(Category::Parameter, r"(?:^|\s)(-{1,2}[A-Za-z0-9][\w-]*)").group(1),
            rule(
                Category::Keyword,
                r"\b(?:if|then|else|elif|fi|for|while|until|do|done|case|esac|in|function|select|return|local|export|declare|readonly|break|continue)\b",
            ),
            rule(
                Category::Function,
                r"\b(?:alias|apt|awk|bash|cat|cd|chmod|chown|cp|curl|cut|date|diff|echo|env|exit|find|git|grep|head|kill|ln|ls|make|mkdir|mv|printf|ps|pwd|read|rm|sed|sleep|sort|source|sudo|tail|tar|tee|test|touch|tr|uniq|wc|wget|xargs)\b",
            ),
            rule(Category::Boolean, r"\b(?:true|false)\b"),
            rule(Category::Number, r"\b\d+(?:\.\d+)?\b"),
            rule(Category::Operator, r"&&|\|\||<<-?|>>|[<>]&?|=~|==?|!=?|[|&]"),
            rule(Category::Punctuation, r"\$\(|[{}\[\]();`]"),
        ],
    )
}

fn json() -> Grammar {
    Grammar::new(
        "json",
        vec![
            rule(Category::Comment, C_COMMENT),
            rule(Category::Property, r#"("(?:\\.|[^\\"\r\n])*")\s*:"#).group(1),
            rule(Category::String, r#""(?:\\.|[^\\"\r\n])*"?"#),
            rule(Category::Number, r"-?\b\d+(?:\.\d+)?(?:[eE][+-]?\d+)?\b"),
            rule(Category::Punctuation, r"[{}\[\],]"),
            rule(Category::Operator, r":"),
            rule(Category::Boolean, r"\b(?:true|false)\b"),
            rule(Category::Keyword, r"\bnull\b"),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::flatten_all;

    fn tokens(lang: &str, line: &str) -> Vec<Token> {
        LanguageRegistry::builtin().get(lang).unwrap().tokenize(line).unwrap()
    }

    fn tagged(tokens: &[Token]) -> Vec<(Category, String)> {
        tokens.iter().filter_map(|t| Some((t.category()?, t.flatten()))).collect()
    }

    #[test]
    fn javascript_declaration() {
        let toks = tokens("javascript", "const x = 1;");
        assert_eq!(
            toks,
            vec![
                Token::node(Category::Keyword, "const"),
                Token::leaf(" x "),
                Token::node(Category::Operator, "="),
                Token::leaf(" "),
                Token::node(Category::Number, "1"),
                Token::node(Category::Punctuation, ";"),
            ]
        );
    }

    #[test]
    fn keyword_wins_tie_with_call() {
        let toks = tagged(&tokens("js", "if (ready) start();"));
        assert_eq!(toks[0], (Category::Keyword, "if".into()));
        assert!(toks.contains(&(Category::Function, "start".into())));
    }

    #[test]
    fn template_string_nests() {
        let toks = tokens("js", "`a ${b}`");
        assert_eq!(toks.len(), 1);
        let Token::NodeList { category, content } = &toks[0] else {
            panic!("expected a node list, got {:?}", toks[0]);
        };
        assert_eq!(*category, Category::TemplateString);
        assert_eq!(content[0], Token::node(Category::Punctuation, "`"));
        assert_eq!(content[1], Token::node(Category::String, "a "));
        assert_eq!(content[2].category(), Some(Category::Interpolation));
        assert_eq!(content[2].flatten(), "${b}");
        assert_eq!(content[3], Token::node(Category::Punctuation, "`"));
    }

    #[test]
    fn python_def_and_comment() {
        let toks = tagged(&tokens("py", "def add(a, b):  # sum"));
        assert_eq!(toks[0], (Category::Keyword, "def".into()));
        assert_eq!(toks[1], (Category::Function, "add".into()));
        assert_eq!(toks.last().unwrap(), &(Category::Comment, "# sum".into()));
    }

    #[test]
    fn rust_macro_and_arrow() {
        let toks = tagged(&tokens("rust", "fn main() -> u8 { println!(\"hi\"); 0 }"));
        assert!(toks.contains(&(Category::Keyword, "fn".into())));
        assert!(toks.contains(&(Category::Function, "main".into())));
        assert!(toks.contains(&(Category::Punctuation, "->".into())));
        assert!(toks.contains(&(Category::Macro, "println!".into())));
        assert!(toks.contains(&(Category::String, "\"hi\"".into())));
    }

    #[test]
    fn bash_string_variables_and_flags() {
        let toks = tokens("bash", "echo \"hi $USER\" --verbose");
        assert_eq!(toks[0], Token::node(Category::Function, "echo"));
        let Token::NodeList { category, content } = &toks[2] else {
            panic!("expected a quoted string list, got {:?}", toks[2]);
        };
        assert_eq!(*category, Category::String);
        assert_eq!(content[1], Token::node(Category::Variable, "$USER"));
        assert_eq!(toks.last().unwrap(), &Token::node(Category::Parameter, "--verbose"));
    }

    #[test]
    fn json_keys_are_properties() {
        let toks = tagged(&tokens("json", r#"{"a": "b", "n": null}"#));
        assert!(toks.contains(&(Category::Property, "\"a\"".into())));
        assert!(toks.contains(&(Category::String, "\"b\"".into())));
        assert!(toks.contains(&(Category::Keyword, "null".into())));
    }

    #[test]
    fn plain_language_has_no_categories() {
        assert!(LanguageRegistry::builtin().get("text").unwrap().is_empty());
        assert_eq!(tokens("plain", "const x = 1;"), vec![Token::leaf("const x = 1;")]);
        assert!(tokens("plain", "").is_empty());
    }

    #[test]
    fn unknown_language_is_unsupported() {
        let registry = LanguageRegistry::builtin();
        assert!(registry.get("brainfuck").is_none());
        assert!(registry.supports("JavaScript"));
        assert!(registry.supports(" py "));
    }

    #[test]
    fn flatten_reproduces_every_line() {
        let samples = [
            ("javascript", "const s = `sum: ${a + b}`; // done"),
            ("javascript", "let r = obj?.value ?? 0x1F + 1.5e3 - .5;"),
            ("javascript", "\"unterminated \\"),
            ("typescript", "interface P { name: string; age?: number }"),
            ("python", "print(f\"{x!r}\", 'q', 1_000j)  # «ünïcode»"),
            ("python", "\"\"\"doc"),
            ("rust", "let v: Vec<&'a str> = vec![r#\"raw\"#, 'c', b'x'];"),
            ("rust", "for i in 0..=10u8 { x != y }"),
            ("bash", "ls -la ${HOME} | grep \"$1\" && echo 'done' # tail"),
            ("json", "{\"k\": [1, -2.5e3, true, null]}"),
            ("plain", "日本語 text"),
            ("javascript", "   "),
        ];
        for (lang, line) in samples {
            let toks = tokens(lang, line);
            assert_eq!(flatten_all(&toks), line, "{lang}: {line}");
        }
    }

    #[test]
    fn nesting_depth_is_bounded() {
        let grammar = Grammar::new("plain", Vec::new());
        let err = grammar.tokenize_at_depth("x", MAX_NESTING + 1).unwrap_err();
        assert!(matches!(err, RenderError::Tokenize(_)));
    }

    #[test]
    fn custom_grammar_registration() {
        let mut registry = LanguageRegistry::new();
        let grammar = Grammar::new("todo", vec![Rule::new(Category::Keyword, r"\bTODO\b").unwrap()]);
        registry.register(grammar, &["Todo"]);
        let toks = registry.get("todo").unwrap().tokenize("x TODO y").unwrap();
        assert_eq!(toks[1], Token::node(Category::Keyword, "TODO"));
    }
}
