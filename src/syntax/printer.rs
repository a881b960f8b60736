//! Tree printer.
//!
//! Each node kind expands into a flat list of [`Piece`]s that the driver
//! pushes onto a work stack, so printing a deep tree never recurses. The same
//! layout serves both modes: compact mode folds line breaks into single
//! spaces, source mode indents blocks by four spaces.

use crate::ast::{NodeKind, NodeRef};

const INDENT: &str = "    ";

#[derive(Clone, Copy)]
enum Piece<'t> {
    Node(NodeRef<'t>),
    Str(&'t str),
    Newline,
    BlankLine,
    Indent,
    Dedent,
}

/// Prints a subtree on a single line.
pub fn print_compact(node: NodeRef<'_>) -> String {
    Printer::new(false).run(node)
}

/// Prints a subtree as indented source text, one statement per line.
pub fn print_source(node: NodeRef<'_>) -> String {
    let mut out = Printer::new(true).run(node);
    if !out.ends_with('\n') {
        out.push('\n');
    }
    out
}

struct Printer {
    out: String,
    depth: usize,
    pretty: bool,
    pending_indent: bool,
}

impl Printer {
    fn new(pretty: bool) -> Self {
        Printer {
            out: String::new(),
            depth: 0,
            pretty,
            pending_indent: false,
        }
    }

    fn run(mut self, node: NodeRef<'_>) -> String {
        let mut stack = vec![Piece::Node(node)];
        while let Some(piece) = stack.pop() {
            match piece {
                Piece::Node(node) => {
                    let pieces = layout(node, self.pretty);
                    stack.extend(pieces.into_iter().rev());
                }
                Piece::Str(text) => self.write(text),
                Piece::Newline => self.newline(false),
                Piece::BlankLine => self.newline(true),
                Piece::Indent => self.depth += 1,
                Piece::Dedent => self.depth = self.depth.saturating_sub(1),
            }
        }
        self.out
    }

    fn write(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if self.pending_indent {
            for _ in 0..self.depth {
                self.out.push_str(INDENT);
            }
            self.pending_indent = false;
        }
        self.out.push_str(text);
    }

    fn newline(&mut self, blank: bool) {
        if !self.pretty {
            if !self.out.is_empty() && !self.out.ends_with(' ') {
                self.out.push(' ');
            }
            return;
        }
        if self.out.is_empty() {
            return;
        }
        if !self.out.ends_with('\n') {
            self.out.push('\n');
        }
        if blank && !self.out.ends_with("\n\n") {
            self.out.push('\n');
        }
        self.pending_indent = true;
    }
}

/// Pieces for one node, in output order.
fn layout<'t>(node: NodeRef<'t>, pretty: bool) -> Vec<Piece<'t>> {
    use Piece::*;

    let mut pieces = Vec::new();
    let text = node.text().unwrap_or("");
    match node.kind() {
        NodeKind::CompilationUnit => {
            let mut previous: Option<NodeKind> = None;
            for child in node.children() {
                if let Some(kind) = previous {
                    pieces.push(if kind != child.kind() || kind == NodeKind::Class {
                        BlankLine
                    } else {
                        Newline
                    });
                }
                pieces.push(Node(child));
                previous = Some(child.kind());
            }
        }
        NodeKind::SnippetFile => separated(&mut pieces, node.children(), BlankLine),
        NodeKind::Package => pieces.extend([Str("package "), Str(text), Str(";")]),
        NodeKind::Import => pieces.extend([Str("import "), Str(text), Str(";")]),
        NodeKind::Class => {
            let mut members = Vec::new();
            for child in node.children() {
                match child.kind() {
                    NodeKind::Modifiers => pieces.push(Node(child)),
                    NodeKind::Identifier => pieces.extend([Str("class "), Node(child)]),
                    NodeKind::Extends | NodeKind::Implements => {
                        pieces.extend([Str(" "), Node(child)])
                    }
                    _ => members.push(child),
                }
            }
            pieces.push(Str(" "));
            body(&mut pieces, members, true);
        }
        NodeKind::AnonymousClass => body(&mut pieces, node.children().collect(), true),
        NodeKind::Extends => {
            pieces.push(Str("extends "));
            separated(&mut pieces, node.children(), Str(", "));
        }
        NodeKind::Implements => {
            pieces.push(Str("implements "));
            separated(&mut pieces, node.children(), Str(", "));
        }
        NodeKind::Method => {
            let mut has_body = false;
            for child in node.children() {
                match child.kind() {
                    NodeKind::TypeElement => {
                        if child.child_count() > 0 || child.text().is_some() {
                            pieces.extend([Node(child), Str(" ")]);
                        }
                    }
                    NodeKind::CodeBlock => {
                        has_body = true;
                        pieces.extend([Str(" "), Node(child)]);
                    }
                    _ => pieces.push(Node(child)),
                }
            }
            if !has_body {
                pieces.push(Str(";"));
            }
        }
        NodeKind::ParameterList | NodeKind::ArgumentList => {
            pieces.push(Str("("));
            separated(&mut pieces, node.children(), Str(", "));
            pieces.push(Str(")"));
        }
        NodeKind::Parameter | NodeKind::Field | NodeKind::LocalVariable => {
            for (index, child) in node.children().enumerate() {
                match index {
                    0 | 1 => pieces.push(Node(child)),
                    2 => pieces.extend([Str(" "), Node(child)]),
                    _ => pieces.extend([Str(" = "), Node(child)]),
                }
            }
            if node.kind() != NodeKind::Parameter {
                pieces.push(Str(";"));
            }
        }
        NodeKind::Modifiers => {
            for word in text.split(' ').filter(|w| !w.is_empty()) {
                pieces.push(Str(word));
                pieces.push(if pretty && word.starts_with('@') {
                    Newline
                } else {
                    Str(" ")
                });
            }
        }
        NodeKind::TypeElement => {
            separated(
                &mut pieces,
                node.children().filter(|c| c.kind() == NodeKind::Identifier),
                Str("."),
            );
            if let Some(args) = node.find_child(NodeKind::TypeArguments) {
                pieces.push(Node(args));
            }
            pieces.push(Str(text));
        }
        NodeKind::TypeArguments => {
            pieces.push(Str("<"));
            separated(&mut pieces, node.children(), Str(", "));
            pieces.push(Str(">"));
        }
        NodeKind::CodeBlock => body(&mut pieces, node.children().collect(), false),
        NodeKind::ExpressionStatement => {
            pieces.extend(node.children().map(Node));
            pieces.push(Str(";"));
        }
        NodeKind::If => {
            for (index, child) in node.children().enumerate() {
                match index {
                    0 => pieces.extend([Str("if ("), Node(child), Str(") ")]),
                    1 => pieces.push(Node(child)),
                    _ => pieces.extend([Str(" else "), Node(child)]),
                }
            }
        }
        NodeKind::Return => {
            pieces.push(Str("return"));
            for child in node.children() {
                pieces.extend([Str(" "), Node(child)]);
            }
            pieces.push(Str(";"));
        }
        NodeKind::Switch => {
            let mut children = node.children();
            if let Some(selector) = children.next() {
                pieces.extend([Str("switch ("), Node(selector), Str(") {"), Indent]);
            }
            for case in children {
                pieces.extend([Newline, Node(case)]);
            }
            pieces.extend([Dedent, Newline, Str("}")]);
        }
        NodeKind::Case => {
            let mut children = node.children().peekable();
            if text == "default" {
                pieces.push(Str("default:"));
            } else {
                pieces.push(Str("case "));
                if let Some(label) = children.next() {
                    pieces.push(Node(label));
                }
                pieces.push(Str(":"));
            }
            pieces.push(Indent);
            for statement in children {
                pieces.extend([Newline, Node(statement)]);
            }
            pieces.push(Dedent);
        }
        NodeKind::Break => pieces.push(Str("break;")),
        NodeKind::Empty => pieces.push(Str(";")),
        NodeKind::Assignment | NodeKind::Binary => {
            let mut children = node.children();
            if let (Some(left), Some(right)) = (children.next(), children.next()) {
                pieces.extend([Node(left), Str(" "), Str(text), Str(" "), Node(right)]);
            }
        }
        NodeKind::Conditional => {
            let mut children = node.children();
            if let (Some(c), Some(a), Some(b)) = (children.next(), children.next(), children.next())
            {
                pieces.extend([Node(c), Str(" ? "), Node(a), Str(" : "), Node(b)]);
            }
        }
        NodeKind::Prefix => {
            pieces.push(Str(text));
            pieces.extend(node.children().map(Node));
        }
        NodeKind::TypeCast => {
            let mut children = node.children();
            if let (Some(ty), Some(operand)) = (children.next(), children.next()) {
                pieces.extend([Str("("), Node(ty), Str(") "), Node(operand)]);
            }
        }
        NodeKind::Parenthesized => {
            pieces.push(Str("("));
            pieces.extend(node.children().map(Node));
            pieces.push(Str(")"));
        }
        NodeKind::MethodCall => pieces.extend(node.children().map(Node)),
        NodeKind::Reference => separated(&mut pieces, node.children(), Str(".")),
        NodeKind::New => {
            pieces.push(Str("new "));
            for child in node.children() {
                if child.kind() == NodeKind::AnonymousClass {
                    pieces.push(Str(" "));
                }
                pieces.push(Node(child));
            }
        }
        NodeKind::ClassLiteral => {
            pieces.extend(node.children().map(Node));
            pieces.push(Str(".class"));
        }
        NodeKind::This => {
            for child in node.children() {
                pieces.extend([Node(child), Str(".")]);
            }
            pieces.push(Str("this"));
        }
        NodeKind::Super => pieces.push(Str("super")),
        NodeKind::Literal | NodeKind::Identifier => pieces.push(Str(text)),
    }
    pieces
}

fn separated<'t>(
    pieces: &mut Vec<Piece<'t>>,
    items: impl Iterator<Item = NodeRef<'t>>,
    separator: Piece<'t>,
) {
    for (index, item) in items.enumerate() {
        if index > 0 {
            pieces.push(separator);
        }
        pieces.push(Piece::Node(item));
    }
}

/// `{ item item ... }` with each item on its own line. Class-like bodies put a
/// blank line between members.
fn body<'t>(pieces: &mut Vec<Piece<'t>>, items: Vec<NodeRef<'t>>, members: bool) {
    if items.is_empty() {
        pieces.push(Piece::Str("{}"));
        return;
    }
    pieces.extend([Piece::Str("{"), Piece::Indent]);
    for (index, item) in items.into_iter().enumerate() {
        pieces.push(if members && index > 0 {
            Piece::BlankLine
        } else {
            Piece::Newline
        });
        pieces.push(Piece::Node(item));
    }
    pieces.extend([Piece::Dedent, Piece::Newline, Piece::Str("}")]);
}
