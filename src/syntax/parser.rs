//! Snippet parser: pest pairs lowered into an arena [`SyntaxTree`].
//!
//! The grammar lives in `syntax/grammar.pest`. Each public entry point parses
//! one construct and returns a tree rooted at it. This parser is purely
//! syntactic; names are left unresolved.

use pest::{error::Error, iterators::Pair, Parser};
use pest_derive::Parser;

use crate::{
    ast::{NodeId, NodeKind, Span, SyntaxTree},
    NavError,
};

#[derive(Parser)]
#[grammar = "syntax/grammar.pest"]
struct SnippetParser;

// ============================================================================
// PUBLIC API
// ============================================================================

/// Parses a source file: optional package, imports and class declarations.
pub fn parse_compilation_unit(source: &str, name: &str) -> Result<SyntaxTree, NavError> {
    parse_entry(Rule::compilation_unit, source, name)
}

/// Parses a macro resource: zero or more method declarations under a
/// `SnippetFile` root.
pub fn parse_snippets(source: &str, name: &str) -> Result<SyntaxTree, NavError> {
    parse_entry(Rule::snippet_file, source, name)
}

/// Parses exactly one method declaration.
pub fn parse_method(source: &str) -> Result<SyntaxTree, NavError> {
    parse_entry(Rule::method_entry, source, "<method>")
}

/// Parses exactly one statement.
pub fn parse_statement(source: &str) -> Result<SyntaxTree, NavError> {
    parse_entry(Rule::statement_entry, source, "<statement>")
}

/// Parses exactly one expression.
pub fn parse_expression(source: &str) -> Result<SyntaxTree, NavError> {
    parse_entry(Rule::expression_entry, source, "<expression>")
}

/// Parses a bodiless method header such as `void onCreate(Bundle b)`.
pub fn parse_signature(source: &str) -> Result<SyntaxTree, NavError> {
    parse_entry(Rule::signature_entry, source, "<signature>")
}

// ============================================================================
// ENTRY HANDLING
// ============================================================================

fn parse_entry(rule: Rule, source: &str, name: &str) -> Result<SyntaxTree, NavError> {
    let mut pairs =
        SnippetParser::parse(rule, source).map_err(|e| convert_parse_error(e, source, name))?;
    let Some(entry) = pairs.next() else {
        return Err(NavError::parse(
            "empty input",
            name,
            source,
            Span::default(),
            None,
        ));
    };

    let mut builder = TreeBuilder {
        tree: SyntaxTree::detached(),
        source,
        name,
    };
    let span = span_of(&entry);
    let root = match rule {
        Rule::compilation_unit => builder.compilation_unit(entry)?,
        Rule::snippet_file => {
            let root = builder.node(NodeKind::SnippetFile, None, span);
            for method in significant(entry) {
                let id = builder.method(method, false)?;
                builder.tree.push_child(root, id);
            }
            root
        }
        Rule::signature_entry => builder.method(entry, false)?,
        _ => {
            let Some(inner) = significant(entry).next() else {
                return Err(builder.error("empty input", span));
            };
            match rule {
                Rule::method_entry => builder.method(inner, false)?,
                Rule::statement_entry => builder.statement(inner)?,
                _ => builder.expression(inner)?,
            }
        }
    };
    builder.tree.set_root(root);
    Ok(builder.tree)
}

fn convert_parse_error(error: Error<Rule>, source: &str, name: &str) -> NavError {
    let span = match error.location {
        pest::error::InputLocation::Pos(pos) => Span {
            start: pos,
            end: pos,
        },
        pest::error::InputLocation::Span((start, end)) => Span { start, end },
    };
    let help = if source.matches('{').count() > source.matches('}').count() {
        Some("a block is missing its closing '}'".to_string())
    } else {
        Some("snippets use a Java subset: check ';' terminators and balanced brackets".to_string())
    };
    NavError::parse(error.variant.message(), name, source, span, help)
}

fn span_of(pair: &Pair<Rule>) -> Span {
    Span {
        start: pair.as_span().start(),
        end: pair.as_span().end(),
    }
}

fn is_keyword(rule: Rule) -> bool {
    matches!(
        rule,
        Rule::kw_break
            | Rule::kw_case
            | Rule::kw_class
            | Rule::kw_default
            | Rule::kw_else
            | Rule::kw_extends
            | Rule::kw_if
            | Rule::kw_implements
            | Rule::kw_import
            | Rule::kw_new
            | Rule::kw_package
            | Rule::kw_return
            | Rule::kw_static
            | Rule::kw_super
            | Rule::kw_switch
            | Rule::kw_this
            | Rule::kw_throws
            | Rule::EOI
    )
}

/// Inner pairs without keyword tokens and end-of-input markers.
fn significant(pair: Pair<'_, Rule>) -> impl Iterator<Item = Pair<'_, Rule>> {
    pair.into_inner().filter(|p| !is_keyword(p.as_rule()))
}

// ============================================================================
// TREE BUILDER
// ============================================================================

struct TreeBuilder<'s> {
    tree: SyntaxTree,
    source: &'s str,
    name: &'s str,
}

/// A postfix chain under construction. Plain dotted names stay unmaterialized
/// until we know whether they end in a call, a class literal or `.this`.
enum Chain {
    Names(Vec<(String, Span)>),
    Node(NodeId),
}

impl<'s> TreeBuilder<'s> {
    fn node(&mut self, kind: NodeKind, text: Option<String>, span: Span) -> NodeId {
        self.tree.alloc(kind, text, span)
    }

    fn leaf_under(&mut self, parent: NodeId, kind: NodeKind, text: &str, span: Span) -> NodeId {
        self.tree.add_child(parent, kind, Some(text.to_string()), span)
    }

    fn error(&self, message: &str, span: Span) -> NavError {
        NavError::parse(message, self.name, self.source, span, None)
    }

    // ------------------------------------------------------------------------
    // declarations
    // ------------------------------------------------------------------------

    fn compilation_unit(&mut self, pair: Pair<'_, Rule>) -> Result<NodeId, NavError> {
        let root = self.node(NodeKind::CompilationUnit, None, span_of(&pair));
        for item in significant(pair) {
            let span = span_of(&item);
            match item.as_rule() {
                Rule::package_decl => {
                    let name = significant(item).next().map(|p| p.as_str().to_string());
                    self.tree.add_child(root, NodeKind::Package, name, span);
                }
                Rule::import_decl => {
                    let name = significant(item).last().map(|p| p.as_str().to_string());
                    self.tree.add_child(root, NodeKind::Import, name, span);
                }
                Rule::class_decl => {
                    let class = self.class(item)?;
                    self.tree.push_child(root, class);
                }
                _ => {}
            }
        }
        Ok(root)
    }

    fn class(&mut self, pair: Pair<'_, Rule>) -> Result<NodeId, NavError> {
        let class = self.node(NodeKind::Class, None, span_of(&pair));
        for part in significant(pair) {
            let span = span_of(&part);
            match part.as_rule() {
                Rule::modifiers => {
                    let modifiers = self.modifiers(part);
                    self.tree.push_child(class, modifiers);
                }
                Rule::identifier => {
                    self.leaf_under(class, NodeKind::Identifier, part.as_str(), span);
                }
                Rule::extends_clause => {
                    let extends = self.tree.add_child(class, NodeKind::Extends, None, span);
                    for ty in significant(part) {
                        let ty = self.type_ref(ty);
                        self.tree.push_child(extends, ty);
                    }
                }
                Rule::implements_clause => {
                    let implements = self.tree.add_child(class, NodeKind::Implements, None, span);
                    for ty in significant(part) {
                        let ty = self.type_ref(ty);
                        self.tree.push_child(implements, ty);
                    }
                }
                Rule::class_body => self.members(class, part)?,
                _ => {}
            }
        }
        Ok(class)
    }

    fn members(&mut self, owner: NodeId, body: Pair<'_, Rule>) -> Result<(), NavError> {
        for member in significant(body) {
            let id = match member.as_rule() {
                Rule::class_decl => self.class(member)?,
                Rule::method_decl => self.method(member, false)?,
                Rule::constructor_decl => self.method(member, true)?,
                Rule::field_decl => self.variable(NodeKind::Field, member)?,
                _ => continue,
            };
            self.tree.push_child(owner, id);
        }
        Ok(())
    }

    /// Methods and constructors share one layout; a constructor gets an empty
    /// return type element.
    fn method(&mut self, pair: Pair<'_, Rule>, constructor: bool) -> Result<NodeId, NavError> {
        let span = span_of(&pair);
        let method = self.node(NodeKind::Method, None, span);
        for part in significant(pair) {
            let part_span = span_of(&part);
            match part.as_rule() {
                Rule::modifiers => {
                    let modifiers = self.modifiers(part);
                    self.tree.push_child(method, modifiers);
                    if constructor {
                        self.tree.add_child(method, NodeKind::TypeElement, None, part_span);
                    }
                }
                Rule::type_ref => {
                    let ty = self.type_ref(part);
                    self.tree.push_child(method, ty);
                }
                Rule::identifier => {
                    self.leaf_under(method, NodeKind::Identifier, part.as_str(), part_span);
                }
                Rule::parameters => {
                    let list = self.tree.add_child(method, NodeKind::ParameterList, None, part_span);
                    for parameter in significant(part) {
                        let id = self.variable(NodeKind::Parameter, parameter)?;
                        self.tree.push_child(list, id);
                    }
                }
                Rule::block => {
                    let body = self.block(part)?;
                    self.tree.push_child(method, body);
                }
                _ => {}
            }
        }
        Ok(method)
    }

    /// Fields, locals and parameters: `Modifiers, TypeElement, Identifier, [init]`.
    fn variable(&mut self, kind: NodeKind, pair: Pair<'_, Rule>) -> Result<NodeId, NavError> {
        let variable = self.node(kind, None, span_of(&pair));
        for part in significant(pair) {
            let span = span_of(&part);
            let id = match part.as_rule() {
                Rule::modifiers => self.modifiers(part),
                Rule::type_ref => self.type_ref(part),
                Rule::identifier => {
                    self.node(NodeKind::Identifier, Some(part.as_str().to_string()), span)
                }
                _ => self.expression(part)?,
            };
            self.tree.push_child(variable, id);
        }
        Ok(variable)
    }

    fn modifiers(&mut self, pair: Pair<'_, Rule>) -> NodeId {
        let span = span_of(&pair);
        let words: Vec<&str> = pair.into_inner().map(|p| p.as_str()).collect();
        let text = (!words.is_empty()).then(|| words.join(" "));
        self.node(NodeKind::Modifiers, text, span)
    }

    fn type_ref(&mut self, pair: Pair<'_, Rule>) -> NodeId {
        let span = span_of(&pair);
        if pair.as_rule() == Rule::wildcard {
            return self.node(NodeKind::TypeElement, Some("?".into()), span);
        }
        let ty = self.node(NodeKind::TypeElement, None, span);
        for part in significant(pair) {
            let part_span = span_of(&part);
            match part.as_rule() {
                Rule::identifier => {
                    self.leaf_under(ty, NodeKind::Identifier, part.as_str(), part_span);
                }
                Rule::type_args => {
                    let args = self.tree.add_child(ty, NodeKind::TypeArguments, None, part_span);
                    for arg in significant(part) {
                        let arg = self.type_ref(arg);
                        self.tree.push_child(args, arg);
                    }
                }
                Rule::array_dims => self.tree.set_text(ty, part.as_str()),
                _ => {}
            }
        }
        ty
    }

    // ------------------------------------------------------------------------
    // statements
    // ------------------------------------------------------------------------

    fn block(&mut self, pair: Pair<'_, Rule>) -> Result<NodeId, NavError> {
        let block = self.node(NodeKind::CodeBlock, None, span_of(&pair));
        for statement in significant(pair) {
            let id = self.statement(statement)?;
            self.tree.push_child(block, id);
        }
        Ok(block)
    }

    fn statement(&mut self, pair: Pair<'_, Rule>) -> Result<NodeId, NavError> {
        let span = span_of(&pair);
        match pair.as_rule() {
            Rule::block => self.block(pair),
            Rule::class_decl => self.class(pair),
            Rule::local_var_decl => self.variable(NodeKind::LocalVariable, pair),
            Rule::break_stmt => Ok(self.node(NodeKind::Break, None, span)),
            Rule::empty_stmt => Ok(self.node(NodeKind::Empty, None, span)),
            Rule::expr_stmt => {
                let statement = self.node(NodeKind::ExpressionStatement, None, span);
                self.children_into(statement, pair)?;
                Ok(statement)
            }
            Rule::return_stmt => {
                let statement = self.node(NodeKind::Return, None, span);
                self.children_into(statement, pair)?;
                Ok(statement)
            }
            Rule::if_stmt => {
                let statement = self.node(NodeKind::If, None, span);
                for (index, part) in significant(pair).enumerate() {
                    let id = if index == 0 {
                        self.expression(part)?
                    } else {
                        self.statement(part)?
                    };
                    self.tree.push_child(statement, id);
                }
                Ok(statement)
            }
            Rule::switch_stmt => {
                let statement = self.node(NodeKind::Switch, None, span);
                for part in significant(pair) {
                    let id = if part.as_rule() == Rule::switch_case {
                        self.switch_case(part)?
                    } else {
                        self.expression(part)?
                    };
                    self.tree.push_child(statement, id);
                }
                Ok(statement)
            }
            _ => Err(self.error("unsupported statement", span)),
        }
    }

    fn switch_case(&mut self, pair: Pair<'_, Rule>) -> Result<NodeId, NavError> {
        let span = span_of(&pair);
        let mut parts = significant(pair);
        let Some(label) = parts.next() else {
            return Err(self.error("case without a label", span));
        };
        let text = if label.as_rule() == Rule::default_label {
            "default"
        } else {
            "case"
        };
        let case = self.node(NodeKind::Case, Some(text.into()), span);
        for value in significant(label) {
            let id = self.expression(value)?;
            self.tree.push_child(case, id);
        }
        for statement in parts {
            let id = self.statement(statement)?;
            self.tree.push_child(case, id);
        }
        Ok(case)
    }

    fn children_into(&mut self, parent: NodeId, pair: Pair<'_, Rule>) -> Result<(), NavError> {
        for part in significant(pair) {
            let id = self.expression(part)?;
            self.tree.push_child(parent, id);
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // expressions
    // ------------------------------------------------------------------------

    fn expression(&mut self, pair: Pair<'_, Rule>) -> Result<NodeId, NavError> {
        let span = span_of(&pair);
        match pair.as_rule() {
            Rule::assignment => {
                let mut parts = significant(pair);
                let Some(target) = parts.next() else {
                    return Err(self.error("empty expression", span));
                };
                let target = self.expression(target)?;
                let (Some(op), Some(value)) = (parts.next(), parts.next()) else {
                    return Ok(target);
                };
                let assignment = self.node(NodeKind::Assignment, Some(op.as_str().into()), span);
                let value = self.expression(value)?;
                self.tree.push_child(assignment, target);
                self.tree.push_child(assignment, value);
                Ok(assignment)
            }
            Rule::conditional => {
                let parts: Vec<_> = significant(pair).collect();
                if parts.len() == 1 {
                    return self.expressions_of(parts).map(|mut ids| ids.remove(0));
                }
                let conditional = self.node(NodeKind::Conditional, None, span);
                for id in self.expressions_of(parts)? {
                    self.tree.push_child(conditional, id);
                }
                Ok(conditional)
            }
            Rule::or_expr
            | Rule::and_expr
            | Rule::equality
            | Rule::relational
            | Rule::additive
            | Rule::multiplicative => self.binary(pair),
            Rule::unary => {
                let mut parts = significant(pair);
                let Some(first) = parts.next() else {
                    return Err(self.error("empty expression", span));
                };
                match first.as_rule() {
                    Rule::prefix_op => {
                        let prefix = self.node(NodeKind::Prefix, Some(first.as_str().into()), span);
                        if let Some(operand) = parts.next() {
                            let operand = self.expression(operand)?;
                            self.tree.push_child(prefix, operand);
                        }
                        Ok(prefix)
                    }
                    _ => self.expression(first),
                }
            }
            Rule::cast => {
                let cast = self.node(NodeKind::TypeCast, None, span);
                for part in significant(pair) {
                    let id = if part.as_rule() == Rule::type_ref {
                        self.type_ref(part)
                    } else {
                        self.expression(part)?
                    };
                    self.tree.push_child(cast, id);
                }
                Ok(cast)
            }
            Rule::postfix => self.postfix(pair),
            _ => {
                let chain = self.primary(pair)?;
                self.materialize(chain)
            }
        }
    }

    fn expressions_of(&mut self, parts: Vec<Pair<'_, Rule>>) -> Result<Vec<NodeId>, NavError> {
        parts.into_iter().map(|p| self.expression(p)).collect()
    }

    /// Left-associative operator levels: `operand (op operand)*`.
    fn binary(&mut self, pair: Pair<'_, Rule>) -> Result<NodeId, NavError> {
        let span = span_of(&pair);
        let mut parts = significant(pair);
        let Some(first) = parts.next() else {
            return Err(self.error("empty expression", span));
        };
        let mut left = self.expression(first)?;
        let start = span.start;
        while let (Some(op), Some(right)) = (parts.next(), parts.next()) {
            let end = right.as_span().end();
            let right = self.expression(right)?;
            let binary = self.node(
                NodeKind::Binary,
                Some(op.as_str().into()),
                Span { start, end },
            );
            self.tree.push_child(binary, left);
            self.tree.push_child(binary, right);
            left = binary;
        }
        Ok(left)
    }

    fn postfix(&mut self, pair: Pair<'_, Rule>) -> Result<NodeId, NavError> {
        let start = pair.as_span().start();
        let mut parts = significant(pair);
        let Some(primary) = parts.next() else {
            return Err(self.error("empty expression", Span { start, end: start }));
        };
        let mut chain = self.primary(primary)?;
        for suffix in parts {
            let span = Span {
                start,
                end: suffix.as_span().end(),
            };
            chain = match suffix.as_rule() {
                Rule::call_suffix => {
                    let mut inner = significant(suffix);
                    let (Some(name), Some(args)) = (inner.next(), inner.next()) else {
                        return Err(self.error("malformed call", span));
                    };
                    let qualifier = self.materialize(chain)?;
                    let call = self.call(Some(qualifier), name, args, span)?;
                    Chain::Node(call)
                }
                Rule::field_suffix => {
                    let Some(name) = significant(suffix).next() else {
                        return Err(self.error("malformed field access", span));
                    };
                    match chain {
                        Chain::Names(mut names) => {
                            names.push((name.as_str().to_string(), span_of(&name)));
                            Chain::Names(names)
                        }
                        Chain::Node(qualifier) => {
                            let reference = self.node(NodeKind::Reference, None, span);
                            self.tree.push_child(reference, qualifier);
                            self.leaf_under(reference, NodeKind::Identifier, name.as_str(), span_of(&name));
                            Chain::Node(reference)
                        }
                    }
                }
                Rule::class_suffix | Rule::this_suffix => {
                    let Chain::Names(names) = chain else {
                        return Err(self.error("expected a type name before '.class' or '.this'", span));
                    };
                    let kind = if suffix.as_rule() == Rule::class_suffix {
                        NodeKind::ClassLiteral
                    } else {
                        NodeKind::This
                    };
                    let node = self.node(kind, None, span);
                    let ty = self.type_from_names(&names);
                    self.tree.push_child(node, ty);
                    Chain::Node(node)
                }
                _ => return Err(self.error("unsupported suffix", span)),
            };
        }
        self.materialize(chain)
    }

    fn primary(&mut self, pair: Pair<'_, Rule>) -> Result<Chain, NavError> {
        let span = span_of(&pair);
        let id = match pair.as_rule() {
            Rule::name => {
                let Some(ident) = significant(pair).next() else {
                    return Err(self.error("expected a name", span));
                };
                return Ok(Chain::Names(vec![(ident.as_str().to_string(), span)]));
            }
            Rule::literal => self.node(NodeKind::Literal, Some(pair.as_str().into()), span),
            Rule::this_expr => self.node(NodeKind::This, None, span),
            Rule::super_expr => self.node(NodeKind::Super, None, span),
            Rule::paren_expr => {
                let paren = self.node(NodeKind::Parenthesized, None, span);
                self.children_into(paren, pair)?;
                paren
            }
            Rule::local_call => {
                let mut inner = significant(pair);
                let (Some(name), Some(args)) = (inner.next(), inner.next()) else {
                    return Err(self.error("malformed call", span));
                };
                self.call(None, name, args, span)?
            }
            Rule::new_expr => {
                let new = self.node(NodeKind::New, None, span);
                for part in significant(pair) {
                    let part_span = span_of(&part);
                    let id = match part.as_rule() {
                        Rule::type_ref => self.type_ref(part),
                        Rule::arguments => self.arguments(part)?,
                        Rule::class_body => {
                            let body = self.node(NodeKind::AnonymousClass, None, part_span);
                            self.members(body, part)?;
                            body
                        }
                        _ => continue,
                    };
                    self.tree.push_child(new, id);
                }
                new
            }
            _ => return Err(self.error("unsupported expression", span)),
        };
        Ok(Chain::Node(id))
    }

    fn call(
        &mut self,
        qualifier: Option<NodeId>,
        name: Pair<'_, Rule>,
        args: Pair<'_, Rule>,
        span: Span,
    ) -> Result<NodeId, NavError> {
        let call = self.node(NodeKind::MethodCall, None, span);
        let name_span = span_of(&name);
        let callee_span = Span {
            start: span.start,
            end: name_span.end,
        };
        let callee = self.tree.add_child(call, NodeKind::Reference, None, callee_span);
        if let Some(qualifier) = qualifier {
            self.tree.push_child(callee, qualifier);
        }
        self.leaf_under(callee, NodeKind::Identifier, name.as_str(), name_span);
        let args = self.arguments(args)?;
        self.tree.push_child(call, args);
        Ok(call)
    }

    fn arguments(&mut self, pair: Pair<'_, Rule>) -> Result<NodeId, NavError> {
        let list = self.node(NodeKind::ArgumentList, None, span_of(&pair));
        self.children_into(list, pair)?;
        Ok(list)
    }

    /// `a.b.c` becomes `Reference(Reference(Reference(a), b), c)`.
    fn materialize(&mut self, chain: Chain) -> Result<NodeId, NavError> {
        let names = match chain {
            Chain::Node(id) => return Ok(id),
            Chain::Names(names) => names,
        };
        let mut current: Option<NodeId> = None;
        let start = names.first().map(|(_, s)| s.start).unwrap_or_default();
        for (name, span) in names {
            let reference = self.node(
                NodeKind::Reference,
                None,
                Span {
                    start,
                    end: span.end,
                },
            );
            if let Some(qualifier) = current {
                self.tree.push_child(reference, qualifier);
            }
            self.leaf_under(reference, NodeKind::Identifier, &name, span);
            current = Some(reference);
        }
        current.ok_or_else(|| self.error("expected a name", Span::default()))
    }

    fn type_from_names(&mut self, names: &[(String, Span)]) -> NodeId {
        let span = Span {
            start: names.first().map(|(_, s)| s.start).unwrap_or_default(),
            end: names.last().map(|(_, s)| s.end).unwrap_or_default(),
        };
        let ty = self.node(NodeKind::TypeElement, None, span);
        for (name, span) in names {
            self.leaf_under(ty, NodeKind::Identifier, name, *span);
        }
        ty
    }
}
