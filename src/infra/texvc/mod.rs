//! Built-in TeX checker: validates and canonicalizes TeX math and reports its
//! identifiers, required packages and parse tree.

mod ast;
mod parser;
mod symbols;

use std::collections::{BTreeSet, HashSet};

use serde_json::Value;

use crate::application::render::{CheckFailure, CheckOptions, Feedback, TexChecker};

use ast::Node;

const GREEK: &[&str] = &[
    "alpha", "beta", "gamma", "delta", "epsilon", "varepsilon", "zeta", "eta", "theta",
    "vartheta", "iota", "kappa", "varkappa", "lambda", "mu", "nu", "xi", "omicron", "pi",
    "varpi", "rho", "varrho", "sigma", "varsigma", "tau", "upsilon", "phi", "varphi", "chi",
    "psi", "omega", "Gamma", "Delta", "Theta", "Lambda", "Xi", "Pi", "Sigma", "Upsilon", "Phi",
    "Psi", "Omega", "digamma", "ell", "hbar", "imath", "jmath",
];

const FONTS: &[&str] = &[
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
];

const AMS: &[&str] = &[
    "mathbb",
    "mathfrak",
    "mathscr",
    "boldsymbol",
    "pmb",
    "operatorname",
    "dfrac",
    "tfrac",
    "cfrac",
    "dbinom",
    "tbinom",
    "overset",
    "underset",
    "iint",
    "iiint",
    "varkappa",
    "digamma",
    "lvert",
    "rvert",
    "lVert",
    "rVert",
    "implies",
    "impliedby",
    "nexists",
    "varnothing",
    "square",
    "blacksquare",
    "therefore",
    "because",
    "leqslant",
    "geqslant",
    "smallmatrix",
    "aligned",
    "alignedat",
    "gathered",
    "split",
    "subarray",
    "pmatrix",
    "bmatrix",
    "Bmatrix",
    "vmatrix",
    "Vmatrix",
];

const CANCEL: &[&str] = &["cancel", "bcancel", "xcancel", "cancelto"];

const COLOR: &[&str] = &["color", "textcolor", "colorbox"];

/// Checker backed by the in-crate TeX parser. Stateless and cheap to share.
#[derive(Debug, Clone, Copy, Default)]
pub struct TexvcChecker;

impl TexvcChecker {
    pub fn new() -> Self {
        Self
    }
}

impl TexChecker for TexvcChecker {
    fn feedback(&self, source: &str, options: CheckOptions) -> Feedback {
        match parser::parse(source, options.chemistry) {
            Ok(nodes) => Feedback::checked(
                ast::canonical(&nodes),
                required_packages(&nodes),
                identifiers(&nodes),
                source.trim_end().ends_with('.'),
            ),
            Err(failure) => Feedback::rejected(failure),
        }
    }

    fn structure(&self, source: &str, compact: bool) -> Result<Value, CheckFailure> {
        let nodes = parser::parse(source, false)?;
        Ok(ast::tree(&nodes, compact))
    }
}

/// Identifiers in source order without repeats: Latin letters, Greek letters, and
/// font-styled symbols such as `\mathcal{S}` taken whole.
fn identifiers(nodes: &[Node]) -> Vec<String> {
    let mut found = Identifiers::default();
    collect_identifiers(nodes, &mut found);
    found.ordered
}

#[derive(Default)]
struct Identifiers {
    ordered: Vec<String>,
    seen: HashSet<String>,
}

impl Identifiers {
    fn push(&mut self, identifier: String) {
        if self.seen.insert(identifier.clone()) {
            self.ordered.push(identifier);
        }
    }
}

fn collect_identifiers(nodes: &[Node], found: &mut Identifiers) {
    for node in nodes {
        match node {
            Node::Literal(c) if c.is_alphabetic() => found.push(c.to_string()),
            Node::Symbol(name) if GREEK.contains(&name.as_str()) => {
                found.push(format!("\\{name}"))
            }
            Node::Apply { name, .. } if FONTS.contains(&name.as_str()) => {
                found.push(ast::canonical(std::slice::from_ref(node)))
            }
            Node::Apply { name, .. } if name == "operatorname" => {}
            Node::Apply { optional, args, .. } => {
                if let Some(optional) = optional {
                    collect_identifiers(optional, found);
                }
                collect_identifiers(args, found);
            }
            Node::Group(children) | Node::Environment { body: children, .. } => {
                collect_identifiers(children, found)
            }
            Node::Sup(arg) | Node::Sub(arg) => {
                collect_identifiers(std::slice::from_ref(arg.as_ref()), found)
            }
            Node::Literal(_) | Node::Symbol(_) | Node::Text { .. } | Node::Delimiter { .. } => {}
        }
    }
}

fn required_packages(nodes: &[Node]) -> Vec<String> {
    let mut packages = BTreeSet::new();
    collect_packages(nodes, &mut packages);
    packages.into_iter().map(str::to_string).collect()
}

fn collect_packages(nodes: &[Node], packages: &mut BTreeSet<&'static str>) {
    for node in nodes {
        match node {
            Node::Symbol(name) | Node::Text { name, .. } => note(name, packages),
            Node::Delimiter { delim, .. } => {
                if let ast::Delim::Symbol(symbol) = delim {
                    note(symbol, packages);
                }
            }
            Node::Apply {
                name,
                optional,
                args,
            } => {
                note(name, packages);
                if let Some(optional) = optional {
                    collect_packages(optional, packages);
                }
                collect_packages(args, packages);
            }
            Node::Environment { name, body, .. } => {
                note(name, packages);
                collect_packages(body, packages);
            }
            Node::Group(children) => collect_packages(children, packages),
            Node::Sup(arg) | Node::Sub(arg) => {
                collect_packages(std::slice::from_ref(arg.as_ref()), packages)
            }
            Node::Literal(_) => {}
        }
    }
}

fn note(name: &str, packages: &mut BTreeSet<&'static str>) {
    if AMS.contains(&name) {
        packages.insert("ams");
    } else if CANCEL.contains(&name) {
        packages.insert("cancel");
    } else if COLOR.contains(&name) {
        packages.insert("color");
    } else if parser::is_chemistry(name) {
        packages.insert("mhchem");
    }
}
