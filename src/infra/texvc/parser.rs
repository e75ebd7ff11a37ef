use crate::application::render::CheckFailure;

use super::{
    ast::{Delim, Node},
    symbols,
};

const SYNTAX_ERROR: &str = "SyntaxError";
const ILLEGAL_FUNCTION: &str = "IllegalFunctionError";

/// Deepest group/argument nesting accepted before the source is rejected.
const MAX_DEPTH: usize = 128;

/// Primitives that define macros, touch files or emit links.
const FORBIDDEN: &[&str] = &[
    "def",
    "gdef",
    "edef",
    "xdef",
    "let",
    "futurelet",
    "newcommand",
    "renewcommand",
    "providecommand",
    "newenvironment",
    "renewenvironment",
    "DeclareMathOperator",
    "input",
    "include",
    "openin",
    "openout",
    "read",
    "write",
    "immediate",
    "special",
    "catcode",
    "csname",
    "endcsname",
    "expandafter",
    "noexpand",
    "url",
    "href",
    "includegraphics",
];

/// MathJax extensions that load code or emit HTML attributes. `\html…` is matched by prefix.
const MATHJAX_MACROS: &[&str] = &[
    "require",
    "style",
    "class",
    "cssId",
    "unicode",
    "mmlToken",
    "bbox",
    "toggle",
    "mathtip",
    "texttip",
    "FormatError",
];

const CHEMISTRY: &[&str] = &["ce", "pu"];

const TEXT_MODE: &[&str] = &[
    "text", "mbox", "hbox", "textrm", "textbf", "textit", "textsf", "texttt", "textnormal", "fbox",
];

const DELIMITER_COMMANDS: &[&str] = &[
    "left", "right", "middle", "big", "Big", "bigg", "Bigg", "bigl", "bigr", "Bigl", "Bigr",
    "biggl", "biggr", "Biggl", "Biggr", "bigm", "Bigm", "biggm", "Biggm",
];

const DELIMITER_CHARS: &[char] = &['(', ')', '[', ']', '|', '.', '/', '<', '>'];

const DELIMITER_SYMBOLS: &[&str] = &[
    "langle",
    "rangle",
    "lfloor",
    "rfloor",
    "lceil",
    "rceil",
    "vert",
    "Vert",
    "lvert",
    "rvert",
    "lVert",
    "rVert",
    "lbrace",
    "rbrace",
    "lbrack",
    "rbrack",
    "backslash",
    "uparrow",
    "downarrow",
    "updownarrow",
    "Uparrow",
    "Downarrow",
    "Updownarrow",
];

const ONE_ARGUMENT: &[&str] = &[
    "mathcal",
    "mathbf",
    "mathrm",
    "mathit",
    "mathbb",
    "mathfrak",
    "mathsf",
    "mathtt",
    "mathscr",
    "boldsymbol",
    "pmb",
    "operatorname",
    "hat",
    "widehat",
    "bar",
    "overline",
    "underline",
    "vec",
    "overrightarrow",
    "overleftarrow",
    "tilde",
    "widetilde",
    "dot",
    "ddot",
    "acute",
    "grave",
    "breve",
    "check",
    "overbrace",
    "underbrace",
    "not",
    "phantom",
    "hphantom",
    "vphantom",
    "mathop",
    "mathrel",
    "mathbin",
    "mathord",
    "cancel",
    "bcancel",
    "xcancel",
    "color",
    "pageref",
    "pmod",
    "boxed",
    "mathring",
    "overleftrightarrow",
    "underleftarrow",
    "underrightarrow",
    "xrightarrow",
    "xleftarrow",
    "smash",
    "hspace",
    "mathpunct",
    "mathopen",
    "mathclose",
    "mathinner",
];

const TWO_ARGUMENTS: &[&str] = &[
    "frac",
    "dfrac",
    "tfrac",
    "cfrac",
    "binom",
    "dbinom",
    "tbinom",
    "stackrel",
    "overset",
    "underset",
    "cancelto",
    "textcolor",
    "colorbox",
];

pub(super) const ENVIRONMENTS: &[&str] = &[
    "matrix",
    "pmatrix",
    "bmatrix",
    "Bmatrix",
    "vmatrix",
    "Vmatrix",
    "smallmatrix",
    "array",
    "subarray",
    "aligned",
    "alignedat",
    "gathered",
    "cases",
    "split",
];

/// Environments whose first argument is a column or count specification.
const SPEC_ENVIRONMENTS: &[&str] = &["array", "subarray", "alignedat"];

pub(super) fn is_chemistry(name: &str) -> bool {
    CHEMISTRY.contains(&name)
}

fn is_illegal(name: &str) -> bool {
    FORBIDDEN.contains(&name) || MATHJAX_MACROS.contains(&name) || name.starts_with("html")
}

/// Parse a TeX math source. Locations in failures are character offsets.
pub(super) fn parse(source: &str, chemistry: bool) -> Result<Vec<Node>, CheckFailure> {
    let mut parser = Parser {
        chars: source.chars().collect(),
        pos: 0,
        depth: 0,
        chemistry,
    };
    parser.sequence(Until::End)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Until<'a> {
    End,
    Brace,
    Bracket,
    Environment(&'a str),
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
    depth: usize,
    chemistry: bool,
}

impl Parser {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn letters(&mut self) -> String {
        let mut name = String::new();
        while let Some(c) = self.peek().filter(char::is_ascii_alphabetic) {
            name.push(c);
            self.pos += 1;
        }
        name
    }

    fn at_end_command(&self) -> bool {
        let rest = &self.chars[self.pos.min(self.chars.len())..];
        rest.starts_with(&['\\', 'e', 'n', 'd']) && !rest.get(4).is_some_and(char::is_ascii_alphabetic)
    }

    fn enter(&mut self) -> Result<(), CheckFailure> {
        if self.depth >= MAX_DEPTH {
            return Err(self.syntax("Expression is nested too deeply"));
        }
        self.depth += 1;
        Ok(())
    }

    fn sequence(&mut self, until: Until<'_>) -> Result<Vec<Node>, CheckFailure> {
        self.enter()?;
        let nodes = self.sequence_items(until);
        self.depth -= 1;
        nodes
    }

    fn sequence_items(&mut self, until: Until<'_>) -> Result<Vec<Node>, CheckFailure> {
        let mut nodes = Vec::new();
        loop {
            self.skip_whitespace();
            let Some(c) = self.peek() else {
                return match until {
                    Until::End => Ok(nodes),
                    Until::Brace => Err(self.syntax("Missing '}'")),
                    Until::Bracket => Err(self.syntax("Missing ']'")),
                    Until::Environment(name) => {
                        Err(self.syntax(format!("Missing \\end{{{name}}}")))
                    }
                };
            };

            match c {
                '}' if until == Until::Brace => {
                    self.pos += 1;
                    return Ok(nodes);
                }
                '}' => return Err(self.syntax("Unexpected '}'")),
                ']' if until == Until::Bracket => {
                    self.pos += 1;
                    return Ok(nodes);
                }
                '{' => {
                    self.pos += 1;
                    nodes.push(Node::Group(self.sequence(Until::Brace)?));
                }
                '^' | '_' => {
                    self.pos += 1;
                    let arg = Box::new(self.argument(if c == '^' { "'^'" } else { "'_'" })?);
                    nodes.push(if c == '^' {
                        Node::Sup(arg)
                    } else {
                        Node::Sub(arg)
                    });
                }
                '#' | '$' | '%' => return Err(self.illegal_char(c)),
                '\\' if self.at_end_command() => {
                    let start = self.pos;
                    let Until::Environment(expected) = until else {
                        return Err(self.syntax("Unexpected \\end"));
                    };
                    self.pos += 4;
                    let name = self.environment_name()?;
                    if name != expected {
                        return Err(failure(
                            SYNTAX_ERROR,
                            format!("\\begin{{{expected}}} ended by \\end{{{name}}}"),
                            start,
                        ));
                    }
                    return Ok(nodes);
                }
                '\\' => nodes.push(self.command()?),
                other => {
                    self.pos += 1;
                    nodes.push(Node::Literal(other));
                }
            }
        }
    }

    /// A single required argument: a braced group, one command or one character.
    fn argument(&mut self, owner: &str) -> Result<Node, CheckFailure> {
        self.enter()?;
        let node = self.argument_node(owner);
        self.depth -= 1;
        node
    }

    fn argument_node(&mut self, owner: &str) -> Result<Node, CheckFailure> {
        self.skip_whitespace();
        match self.peek() {
            None | Some('}') => Err(self.syntax(format!("Missing argument for {owner}"))),
            Some('\\') if self.at_end_command() => {
                Err(self.syntax(format!("Missing argument for {owner}")))
            }
            Some('{') => {
                self.pos += 1;
                Ok(Node::Group(self.sequence(Until::Brace)?))
            }
            Some('\\') => self.command(),
            Some(c @ ('#' | '$' | '%')) => Err(self.illegal_char(c)),
            Some(c @ ('^' | '_' | '&')) => Err(self.syntax(format!("Unexpected '{c}'"))),
            Some(c) => {
                self.pos += 1;
                Ok(Node::Literal(c))
            }
        }
    }

    fn command(&mut self) -> Result<Node, CheckFailure> {
        let start = self.pos;
        self.pos += 1;
        let name = match self.peek() {
            None => {
                return Err(failure(
                    SYNTAX_ERROR,
                    "Unexpected end of input after '\\'",
                    start,
                ));
            }
            Some(c) if c.is_ascii_alphabetic() => self.letters(),
            Some(c) => {
                self.pos += 1;
                return Ok(Node::Symbol(c.to_string()));
            }
        };

        if is_illegal(&name) {
            return Err(failure(
                ILLEGAL_FUNCTION,
                format!("Illegal TeX function \\{name}"),
                start,
            ));
        }
        if is_chemistry(&name) && !self.chemistry {
            return Err(failure(
                ILLEGAL_FUNCTION,
                format!("\\{name} is only allowed for chemistry input"),
                start,
            ));
        }

        match name.as_str() {
            "begin" => self.environment(start),
            "end" => Err(failure(SYNTAX_ERROR, "Unexpected \\end", start)),
            "sqrt" => {
                self.skip_whitespace();
                let optional = if self.peek() == Some('[') {
                    self.pos += 1;
                    Some(self.sequence(Until::Bracket)?)
                } else {
                    None
                };
                let arg = self.argument("\\sqrt")?;
                Ok(Node::Apply {
                    name,
                    optional,
                    args: vec![arg],
                })
            }
            n if DELIMITER_COMMANDS.contains(&n) => {
                let delim = self.delimiter(&name)?;
                Ok(Node::Delimiter { name, delim })
            }
            n if TEXT_MODE.contains(&n) || is_chemistry(n) => {
                let raw = self.raw_group(&name)?;
                Ok(Node::Text { name, raw })
            }
            n => {
                let arity = if TWO_ARGUMENTS.contains(&n) {
                    2
                } else if ONE_ARGUMENT.contains(&n) {
                    1
                } else if symbols::is_known(n) {
                    return Ok(Node::Symbol(name));
                } else {
                    return Err(failure(
                        ILLEGAL_FUNCTION,
                        format!("Unknown TeX function \\{name}"),
                        start,
                    ));
                };
                let owner = format!("\\{name}");
                let args = (0..arity)
                    .map(|_| self.argument(&owner))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Node::Apply {
                    name,
                    optional: None,
                    args,
                })
            }
        }
    }

    fn environment(&mut self, start: usize) -> Result<Node, CheckFailure> {
        let name = self.environment_name()?;
        if !ENVIRONMENTS.contains(&name.as_str()) {
            return Err(failure(
                SYNTAX_ERROR,
                format!("Unknown environment '{name}'"),
                start,
            ));
        }
        let spec = if SPEC_ENVIRONMENTS.contains(&name.as_str()) {
            Some(self.raw_group(&name)?)
        } else {
            None
        };
        let body = self.sequence(Until::Environment(&name))?;
        Ok(Node::Environment { name, spec, body })
    }

    fn environment_name(&mut self) -> Result<String, CheckFailure> {
        self.skip_whitespace();
        if self.peek() != Some('{') {
            return Err(self.syntax("Missing environment name"));
        }
        self.pos += 1;
        let mut name = self.letters();
        if self.peek() == Some('*') {
            name.push('*');
            self.pos += 1;
        }
        if name.is_empty() || self.peek() != Some('}') {
            return Err(self.syntax("Invalid environment name"));
        }
        self.pos += 1;
        Ok(name)
    }

    fn delimiter(&mut self, owner: &str) -> Result<Delim, CheckFailure> {
        self.skip_whitespace();
        let start = self.pos;
        match self.bump() {
            Some('\\') => match self.peek() {
                Some(c) if c.is_ascii_alphabetic() => {
                    let name = self.letters();
                    if DELIMITER_SYMBOLS.contains(&name.as_str()) {
                        Ok(Delim::Symbol(name))
                    } else {
                        Err(failure(
                            SYNTAX_ERROR,
                            format!("Invalid delimiter \\{name} after \\{owner}"),
                            start,
                        ))
                    }
                }
                Some(c @ ('{' | '}' | '|')) => {
                    self.pos += 1;
                    Ok(Delim::Symbol(c.to_string()))
                }
                _ => Err(failure(
                    SYNTAX_ERROR,
                    format!("Invalid delimiter after \\{owner}"),
                    start,
                )),
            },
            Some(c) if DELIMITER_CHARS.contains(&c) => Ok(Delim::Char(c)),
            _ => Err(failure(
                SYNTAX_ERROR,
                format!("Missing delimiter after \\{owner}"),
                start,
            )),
        }
    }

    /// A braced argument kept verbatim, for text-mode and chemistry commands.
    fn raw_group(&mut self, owner: &str) -> Result<String, CheckFailure> {
        self.skip_whitespace();
        if self.peek() != Some('{') {
            return Err(self.syntax(format!("Missing argument for \\{owner}")));
        }
        self.pos += 1;

        let mut raw = String::new();
        let mut depth = 0usize;
        loop {
            let Some(c) = self.bump() else {
                return Err(self.syntax("Missing '}'"));
            };
            match c {
                '{' => depth += 1,
                '}' if depth == 0 => return Ok(raw),
                '}' => depth -= 1,
                '#' | '$' | '%' => {
                    self.pos -= 1;
                    return Err(self.illegal_char(c));
                }
                '\\' => {
                    let start = self.pos - 1;
                    raw.push('\\');
                    match self.peek() {
                        Some(next) if next.is_ascii_alphabetic() => {
                            let name = self.letters();
                            if is_illegal(&name) {
                                return Err(failure(
                                    ILLEGAL_FUNCTION,
                                    format!("Illegal TeX function \\{name}"),
                                    start,
                                ));
                            }
                            raw.push_str(&name);
                        }
                        Some(next) => {
                            self.pos += 1;
                            raw.push(next);
                        }
                        None => {}
                    }
                    continue;
                }
                _ => {}
            }
            raw.push(c);
        }
    }

    fn syntax(&self, message: impl Into<String>) -> CheckFailure {
        failure(SYNTAX_ERROR, message, self.pos)
    }

    fn illegal_char(&self, c: char) -> CheckFailure {
        failure(SYNTAX_ERROR, format!("Illegal character '{c}'"), self.pos)
    }
}

fn failure(name: &str, message: impl Into<String>, location: usize) -> CheckFailure {
    CheckFailure {
        name: name.to_string(),
        message: message.into(),
        location: Some(location),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rejected(source: &str) -> CheckFailure {
        parse(source, false).expect_err("source should be rejected")
    }

    #[test]
    fn scripts_take_single_token_or_group_arguments() {
        let nodes = parse("x^2_{ij}", false).expect("parse");
        assert_eq!(
            nodes,
            vec![
                Node::Literal('x'),
                Node::Sup(Box::new(Node::Literal('2'))),
                Node::Sub(Box::new(Node::Group(vec![
                    Node::Literal('i'),
                    Node::Literal('j')
                ]))),
            ]
        );
    }

    #[test]
    fn commands_collect_their_arguments() {
        let nodes = parse("\\frac\\alpha 2", false).expect("parse");
        assert_eq!(
            nodes,
            vec![Node::Apply {
                name: "frac".into(),
                optional: None,
                args: vec![Node::Symbol("alpha".into()), Node::Literal('2')],
            }]
        );
    }

    #[test]
    fn unbalanced_groups_report_their_position() {
        let err = rejected("\\frac{1}{2");
        assert_eq!(err.name, "SyntaxError");
        assert_eq!(err.message, "Missing '}'");
        assert_eq!(err.location, Some(10));

        let err = rejected("a}");
        assert_eq!(err.message, "Unexpected '}'");
        assert_eq!(err.location, Some(1));
    }

    #[test]
    fn missing_arguments_are_rejected() {
        assert_eq!(rejected("x^").message, "Missing argument for '^'");
        assert_eq!(rejected("\\frac{1}").message, "Missing argument for \\frac");
        assert_eq!(rejected("\\text").message, "Missing argument for \\text");
    }

    #[test]
    fn dangerous_primitives_are_illegal_everywhere() {
        for source in ["\\def\\x{1}", "\\href{http://example.org}{x}", "\\text{\\input{a}}"] {
            let err = rejected(source);
            assert_eq!(err.name, "IllegalFunctionError", "{source}");
        }
        for source in ["#1", "a$b", "50%", "\\text{a$b}"] {
            let err = rejected(source);
            assert!(err.message.starts_with("Illegal character"), "{source}");
        }
    }

    #[test]
    fn mathjax_extension_macros_are_illegal() {
        for source in [
            "\\require{action}",
            "\\style{color:red}{x}",
            "\\class{x}{y}",
            "\\cssId{x}{y}",
            "\\unicode{x41}",
            "\\mmlToken{mi}{x}",
            "\\bbox[red]{x}",
            "\\toggle{a}{b}\\endtoggle",
            "\\htmlStyle{color:red}{x}",
            "\\htmlAttribute{x}",
            "\\text{\\style{color:red}{x}}",
        ] {
            let err = rejected(source);
            assert_eq!(err.name, "IllegalFunctionError", "{source}");
            assert!(err.message.starts_with("Illegal TeX function"), "{source}");
        }
    }

    #[test]
    fn unknown_commands_are_rejected_and_known_symbols_pass() {
        let err = rejected("x + \\foo");
        assert_eq!(err.name, "IllegalFunctionError");
        assert_eq!(err.message, "Unknown TeX function \\foo");
        assert_eq!(err.location, Some(4));

        for source in [
            "\\sum_{i=0}^\\infty i^{-2}",
            "\\lim_{x\\to 0}\\sin x",
            "a \\leq b \\Rightarrow \\langle a \\rangle",
            "x \\bmod 2 \\quad \\pmod{3}",
        ] {
            assert!(parse(source, false).is_ok(), "{source}");
        }
    }

    #[test]
    fn deep_nesting_is_rejected_without_exhausting_the_stack() {
        for source in [
            format!("{}x{}", "{".repeat(100_000), "}".repeat(100_000)),
            format!("{}x{}", "x^{".repeat(50_000), "}".repeat(50_000)),
            format!("{}x", "\\hat".repeat(50_000)),
        ] {
            let err = rejected(&source);
            assert_eq!(err.name, "SyntaxError");
            assert_eq!(err.message, "Expression is nested too deeply");
        }

        let nested = format!("{}x{}", "{".repeat(MAX_DEPTH - 1), "}".repeat(MAX_DEPTH - 1));
        assert!(parse(&nested, false).is_ok());
    }

    #[test]
    fn chemistry_commands_need_the_chemistry_flag() {
        let err = rejected("\\ce{H2O}");
        assert_eq!(err.name, "IllegalFunctionError");

        let nodes = parse("\\ce{H2O}", true).expect("chemistry");
        assert_eq!(
            nodes,
            vec![Node::Text {
                name: "ce".into(),
                raw: "H2O".into()
            }]
        );
    }

    #[test]
    fn environments_must_match() {
        assert!(parse("\\begin{matrix}a&b\\\\c&d\\end{matrix}", false).is_ok());

        let err = rejected("\\begin{matrix}a\\end{cases}");
        assert_eq!(err.message, "\\begin{matrix} ended by \\end{cases}");
        assert_eq!(rejected("\\begin{matrix}a").message, "Missing \\end{matrix}");
        assert_eq!(rejected("\\begin{tabular}a").message, "Unknown environment 'tabular'");
        assert_eq!(rejected("a\\end{matrix}").message, "Unexpected \\end");
    }

    #[test]
    fn delimiters_are_validated() {
        assert!(parse("\\left(\\frac{a}{b}\\right.", false).is_ok());
        assert!(parse("\\left\\langle x\\right\\}", false).is_ok());
        assert!(rejected("\\left\\alpha").message.starts_with("Invalid delimiter"));
        assert!(rejected("\\left").message.starts_with("Missing delimiter"));
    }
}
