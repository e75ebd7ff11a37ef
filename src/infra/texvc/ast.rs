use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum Node {
    Literal(char),
    /// Control sequence without arguments; the name excludes the backslash.
    Symbol(String),
    Group(Vec<Node>),
    Sup(Box<Node>),
    Sub(Box<Node>),
    Apply {
        name: String,
        optional: Option<Vec<Node>>,
        args: Vec<Node>,
    },
    /// Text-mode command whose argument is kept verbatim.
    Text {
        name: String,
        raw: String,
    },
    Delimiter {
        name: String,
        delim: Delim,
    },
    Environment {
        name: String,
        spec: Option<String>,
        body: Vec<Node>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum Delim {
    Char(char),
    Symbol(String),
}

/// Print nodes in canonical form: no insignificant whitespace, every script and
/// command argument braced.
pub(super) fn canonical(nodes: &[Node]) -> String {
    let mut printer = Canonical::default();
    for node in nodes {
        printer.node(node);
    }
    printer.out
}

#[derive(Default)]
struct Canonical {
    out: String,
    /// A letter-named control sequence was just written; a following letter needs a space.
    pending_space: bool,
}

impl Canonical {
    fn text(&mut self, text: &str) {
        if self.pending_space && text.starts_with(|c: char| c.is_ascii_alphabetic()) {
            self.out.push(' ');
        }
        self.pending_space = false;
        self.out.push_str(text);
    }

    fn control(&mut self, name: &str) {
        self.text("\\");
        self.out.push_str(name);
        self.pending_space = name.starts_with(|c: char| c.is_ascii_alphabetic());
    }

    fn group(&mut self, children: &[Node]) {
        self.text("{");
        for child in children {
            self.node(child);
        }
        self.text("}");
    }

    fn braced(&mut self, node: &Node) {
        match node {
            Node::Group(children) => self.group(children),
            other => self.group(std::slice::from_ref(other)),
        }
    }

    fn node(&mut self, node: &Node) {
        match node {
            Node::Literal(c) => self.text(c.encode_utf8(&mut [0; 4])),
            Node::Symbol(name) => self.control(name),
            Node::Group(children) => self.group(children),
            Node::Sup(arg) => {
                self.text("^");
                self.braced(arg);
            }
            Node::Sub(arg) => {
                self.text("_");
                self.braced(arg);
            }
            Node::Apply {
                name,
                optional,
                args,
            } => {
                self.control(name);
                if let Some(optional) = optional {
                    self.text("[");
                    for child in optional {
                        self.node(child);
                    }
                    self.text("]");
                }
                for arg in args {
                    self.braced(arg);
                }
            }
            Node::Text { name, raw } => {
                self.control(name);
                self.text("{");
                self.out.push_str(raw);
                self.text("}");
            }
            Node::Delimiter { name, delim } => {
                self.control(name);
                match delim {
                    Delim::Char(c) => self.text(c.encode_utf8(&mut [0; 4])),
                    Delim::Symbol(symbol) => self.control(symbol),
                }
            }
            Node::Environment { name, spec, body } => {
                self.control("begin");
                self.text("{");
                self.out.push_str(name);
                self.text("}");
                if let Some(spec) = spec {
                    self.text("{");
                    self.out.push_str(spec);
                    self.text("}");
                }
                for child in body {
                    self.node(child);
                }
                self.control("end");
                self.text("{");
                self.out.push_str(name);
                self.text("}");
            }
        }
    }
}

/// JSON parse tree rooted at `{"name": "root"}`. Compact trees omit empty `children`.
pub(super) fn tree(nodes: &[Node], compact: bool) -> Value {
    branch("root", None, children(nodes, compact), compact)
}

fn children(nodes: &[Node], compact: bool) -> Vec<Value> {
    nodes.iter().map(|node| node_tree(node, compact)).collect()
}

fn node_tree(node: &Node, compact: bool) -> Value {
    match node {
        Node::Literal(c) => branch("literal", Some(c.to_string()), Vec::new(), compact),
        Node::Symbol(name) => branch("command", Some(format!("\\{name}")), Vec::new(), compact),
        Node::Group(nodes) => branch("group", None, children(nodes, compact), compact),
        Node::Sup(arg) => branch("sup", None, vec![node_tree(arg, compact)], compact),
        Node::Sub(arg) => branch("sub", None, vec![node_tree(arg, compact)], compact),
        Node::Apply {
            name,
            optional,
            args,
        } => {
            let mut nodes = Vec::with_capacity(args.len() + 1);
            if let Some(optional) = optional {
                nodes.push(branch(
                    "optional",
                    None,
                    children(optional, compact),
                    compact,
                ));
            }
            nodes.extend(args.iter().map(|arg| node_tree(arg, compact)));
            branch("command", Some(format!("\\{name}")), nodes, compact)
        }
        Node::Text { .. } => branch(
            "text",
            Some(canonical(std::slice::from_ref(node))),
            Vec::new(),
            compact,
        ),
        Node::Delimiter { .. } => branch(
            "delimiter",
            Some(canonical(std::slice::from_ref(node))),
            Vec::new(),
            compact,
        ),
        Node::Environment { name, body, .. } => branch(
            "environment",
            Some(name.clone()),
            children(body, compact),
            compact,
        ),
    }
}

fn branch(name: &str, value: Option<String>, children: Vec<Value>, compact: bool) -> Value {
    let mut object = Map::new();
    object.insert("name".to_string(), Value::from(name));
    if let Some(value) = value {
        object.insert("value".to_string(), Value::from(value));
    }
    if !(compact && children.is_empty()) {
        object.insert("children".to_string(), Value::Array(children));
    }
    Value::Object(object)
}
