//! Call-site views over the tree-sitter AST.
//!
//! Every `call_expression` in a file is turned into a [`TsCallSite`]: a
//! closed, serializable description of the callee chain, the first argument
//! and the syntactic context the call sits in. Rules match on these tagged
//! variants instead of poking at raw node kinds.
//!
//! All text fields are verbatim slices of the original source.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tree_sitter::Node;

use crate::parse::ast::{AstLocation, ParsedFile};

/// One call expression.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TsCallSite {
    pub callee: Callee,
    /// First argument, if the call has any.
    pub first_argument: Option<Argument>,
    /// Number of arguments (comments excluded).
    pub argument_count: usize,
    /// The call is the whole expression of an expression statement, so its
    /// value is discarded.
    pub is_statement: bool,
    /// `await` is legal at the call's position: inside an async function,
    /// or at module top level.
    pub await_allowed: bool,
    /// The call's subtree contains parse errors or missing tokens.
    pub has_syntax_error: bool,
    /// Start byte offset of the whole call
    pub start_byte: usize,
    /// End byte offset of the whole call
    pub end_byte: usize,
    pub location: AstLocation,
}

/// Shape of the expression being called.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum Callee {
    /// `name(...)`
    Identifier { name: String },
    /// `receiver.property(...)` or `receiver?.property(...)`
    Member {
        property: String,
        receiver: Receiver,
        /// Access steps from the callee back toward the root object.
        /// `links[0]` is the `.property` access itself.
        links: Vec<ChainLink>,
    },
    /// Anything else (`(fn)(...)`, `a[b](...)`, `new X()(...)`, ...).
    Other { kind: String },
}

/// The object a method is called on.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Receiver {
    pub text: String,
    /// Re-evaluating the expression has no side effects: no calls, `new`,
    /// assignments, updates, `await` or `yield` inside it.
    pub is_pure: bool,
    pub identifiers: BTreeSet<String>,
}

/// One step of a member/call chain.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChainLink {
    pub kind: LinkKind,
    /// Reached through `?.`.
    pub optional: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum LinkKind {
    /// `a.b`
    Property,
    /// `a[b]`
    Subscript,
    /// `a(b)`
    Call,
}

/// A call argument.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum Argument {
    Function(Callback),
    Other { kind: String },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CallbackForm {
    Arrow,
    Function,
    Generator,
}

/// A function-valued argument.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Callback {
    pub form: CallbackForm,
    pub is_async: bool,
    pub params: Vec<Parameter>,
    pub body: CallbackBody,
    /// A `return` statement belongs to the callback itself (not to a
    /// nested function).
    pub returns_early: bool,
    /// A non-arrow callback reads `this`, `arguments` or `new.target`.
    pub uses_function_scope: bool,
    /// An `await` (or `for await`) belongs to the callback itself.
    pub contains_await: bool,
    /// A `var` binding belongs to the callback itself.
    pub declares_var: bool,
    /// Names declared by the body's top-level statements.
    pub declared_names: BTreeSet<String>,
    /// Every identifier spelled anywhere inside the callback.
    pub identifiers: BTreeSet<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum CallbackBody {
    /// `{ ... }`; `inner` is the text between the braces.
    Block { inner: String },
    /// Concise arrow body.
    Expression { text: String },
}

/// A callback parameter, possibly carrying a default value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Parameter {
    pub pattern: Pattern,
    pub default: Option<String>,
    /// Names bound by the pattern.
    pub names: BTreeSet<String>,
    /// Identifiers read by the default value.
    pub default_names: BTreeSet<String>,
}

impl Parameter {
    /// Split into the bare pattern and the default-value text.
    pub fn unwrap(&self) -> (&Pattern, Option<&str>) {
        (&self.pattern, self.default.as_deref())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum Pattern {
    Identifier(String),
    Object(String),
    Array(String),
    /// Rest elements, `this` parameters and anything else.
    Unsupported(String),
}

impl Pattern {
    pub fn text(&self) -> &str {
        match self {
            Pattern::Identifier(t)
            | Pattern::Object(t)
            | Pattern::Array(t)
            | Pattern::Unsupported(t) => t,
        }
    }

    pub fn is_destructuring(&self) -> bool {
        matches!(self, Pattern::Object(_) | Pattern::Array(_))
    }
}

const IMPURE_KINDS: &[&str] = &[
    "call_expression",
    "new_expression",
    "assignment_expression",
    "augmented_assignment_expression",
    "update_expression",
    "await_expression",
    "yield_expression",
];

const IDENTIFIER_KINDS: &[&str] = &[
    "identifier",
    "shorthand_property_identifier",
    "shorthand_property_identifier_pattern",
];

/// Functions that get their own `this`, `arguments` and `return` target.
fn is_function_boundary(kind: &str) -> bool {
    matches!(
        kind,
        "function_declaration"
            | "function_expression"
            | "function"
            | "generator_function"
            | "generator_function_declaration"
            | "method_definition"
            | "class_declaration"
            | "abstract_class_declaration"
            | "class"
    )
}

/// Visit every call expression in document order.
pub fn walk_call_sites<F>(parsed: &ParsedFile, mut visit: F)
where
    F: FnMut(TsCallSite),
{
    let mut cursor = parsed.tree.root_node().walk();
    loop {
        let node = cursor.node();
        if node.kind() == "call_expression" {
            if let Some(call) = build_call_site(parsed, &node) {
                visit(call);
            }
        }

        if cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return;
            }
        }
    }
}

/// Build the view for one `call_expression` node.
pub fn build_call_site(parsed: &ParsedFile, node: &Node) -> Option<TsCallSite> {
    if node.kind() != "call_expression" {
        return None;
    }

    let function = node.child_by_field_name("function")?;
    let callee = match function.kind() {
        "identifier" => Callee::Identifier {
            name: parsed.text_for_node(&function),
        },
        "member_expression" => build_member_callee(parsed, &function)
            .unwrap_or_else(|| Callee::Other {
                kind: function.kind().to_string(),
            }),
        other => Callee::Other {
            kind: other.to_string(),
        },
    };

    // Tagged templates carry a template string instead of an argument list.
    let arguments: Vec<Node> = node
        .child_by_field_name("arguments")
        .filter(|args| args.kind() == "arguments")
        .map(|args| named_children(&args))
        .unwrap_or_default();

    let first_argument = arguments.first().map(|arg| build_argument(parsed, arg));

    Some(TsCallSite {
        callee,
        first_argument,
        argument_count: arguments.len(),
        is_statement: node
            .parent()
            .map(|p| p.kind() == "expression_statement")
            .unwrap_or(false),
        await_allowed: await_allowed_at(parsed, node),
        has_syntax_error: node.has_error(),
        start_byte: node.start_byte(),
        end_byte: node.end_byte(),
        location: parsed.location_for_node(node),
    })
}

fn build_member_callee(parsed: &ParsedFile, member: &Node) -> Option<Callee> {
    let property = member.child_by_field_name("property")?;
    let object = member.child_by_field_name("object")?;

    Some(Callee::Member {
        property: parsed.text_for_node(&property),
        receiver: Receiver {
            text: parsed.text_for_node(&object),
            is_pure: !any_descendant(object, &|_| false, &|n| IMPURE_KINDS.contains(&n.kind())),
            identifiers: collect_identifiers(parsed, object),
        },
        links: chain_links(*member),
    })
}

/// Collect access steps starting at `start` and walking toward the root.
fn chain_links(start: Node) -> Vec<ChainLink> {
    let mut links = Vec::new();
    let mut current = Some(start);

    while let Some(node) = current {
        let (kind, next) = match node.kind() {
            "member_expression" => (LinkKind::Property, node.child_by_field_name("object")),
            "subscript_expression" => (LinkKind::Subscript, node.child_by_field_name("object")),
            "call_expression" => (LinkKind::Call, node.child_by_field_name("function")),
            // `a?.b!.c` is still one optional chain
            "non_null_expression" => {
                current = named_children(&node).into_iter().next();
                continue;
            }
            _ => break,
        };
        links.push(ChainLink {
            kind,
            optional: has_direct_token(&node, &["optional_chain", "?."]),
        });
        current = next;
    }

    links
}

fn build_argument(parsed: &ParsedFile, node: &Node) -> Argument {
    let mut node = *node;
    while node.kind() == "parenthesized_expression" {
        match named_children(&node).into_iter().next() {
            Some(inner) => node = inner,
            None => break,
        }
    }

    let form = match node.kind() {
        "arrow_function" => CallbackForm::Arrow,
        "function_expression" | "function" => CallbackForm::Function,
        "generator_function" => CallbackForm::Generator,
        other => {
            return Argument::Other {
                kind: other.to_string(),
            };
        }
    };

    match build_callback(parsed, &node, form) {
        Some(callback) => Argument::Function(callback),
        None => Argument::Other {
            kind: node.kind().to_string(),
        },
    }
}

fn build_callback(parsed: &ParsedFile, node: &Node, form: CallbackForm) -> Option<Callback> {
    let body_node = node.child_by_field_name("body")?;

    let params = if let Some(single) = node.child_by_field_name("parameter") {
        // `async x => ...`
        vec![make_parameter(parsed, &single, Some(single), None)]
    } else if let Some(list) = node.child_by_field_name("parameters") {
        named_children(&list)
            .iter()
            .map(|p| build_parameter(parsed, p))
            .collect()
    } else {
        Vec::new()
    };

    let (body, returns_early, declared_names) = if body_node.kind() == "statement_block" {
        let text = parsed.str_for_node(&body_node);
        let inner = text.strip_prefix('{').unwrap_or(text);
        let inner = inner.strip_suffix('}').unwrap_or(inner);
        let returns = any_descendant(
            body_node,
            &|n| is_function_boundary(n.kind()) || n.kind() == "arrow_function",
            &|n| n.kind() == "return_statement",
        );
        (
            CallbackBody::Block {
                inner: inner.to_string(),
            },
            returns,
            top_level_declarations(parsed, &body_node),
        )
    } else {
        (
            CallbackBody::Expression {
                text: parsed.text_for_node(&body_node),
            },
            false,
            BTreeSet::new(),
        )
    };

    let own_name = node
        .child_by_field_name("name")
        .map(|n| parsed.text_for_node(&n));

    let uses_function_scope = form != CallbackForm::Arrow
        && (any_descendant(
            body_node,
            &|n| is_function_boundary(n.kind()),
            &|n| match n.kind() {
                "this" | "meta_property" => true,
                "identifier" => parsed.str_for_node(n) == "arguments",
                _ => false,
            },
        ) || own_name.as_deref().is_some_and(|name| {
            // a named function expression calling itself
            any_descendant(body_node, &|_| false, &|n| {
                n.kind() == "identifier" && parsed.str_for_node(n) == name
            })
        }));

    let contains_await = any_descendant(
        body_node,
        &|n| is_function_boundary(n.kind()) || n.kind() == "arrow_function",
        &|n| {
            n.kind() == "await_expression"
                || (n.kind() == "for_in_statement" && has_direct_token(n, &["await"]))
        },
    );

    // `for (var x of ...)` has no declaration node of its own
    let declares_var = any_descendant(
        body_node,
        &|n| is_function_boundary(n.kind()) || n.kind() == "arrow_function",
        &|n| {
            n.kind() == "variable_declaration"
                || (n.kind() == "for_in_statement" && has_direct_token(n, &["var"]))
        },
    );

    Some(Callback {
        form,
        is_async: has_direct_token(node, &["async"]),
        params,
        body,
        returns_early,
        uses_function_scope,
        contains_await,
        declares_var,
        declared_names,
        identifiers: collect_identifiers(parsed, *node),
    })
}

fn build_parameter(parsed: &ParsedFile, node: &Node) -> Parameter {
    match node.kind() {
        // TypeScript: `x: T = d`, `x?: T`
        "required_parameter" | "optional_parameter" => make_parameter(
            parsed,
            node,
            node.child_by_field_name("pattern"),
            node.child_by_field_name("value"),
        ),
        // JavaScript: `x = d`
        "assignment_pattern" => make_parameter(
            parsed,
            node,
            node.child_by_field_name("left"),
            node.child_by_field_name("right"),
        ),
        _ => make_parameter(parsed, node, Some(*node), None),
    }
}

fn make_parameter(
    parsed: &ParsedFile,
    whole: &Node,
    pattern: Option<Node>,
    default: Option<Node>,
) -> Parameter {
    match pattern {
        Some(p) => Parameter {
            pattern: classify_pattern(parsed, &p),
            default: default.map(|v| parsed.text_for_node(&v)),
            names: collect_identifiers(parsed, p),
            default_names: default
                .map(|v| collect_identifiers(parsed, v))
                .unwrap_or_default(),
        },
        None => Parameter {
            pattern: Pattern::Unsupported(parsed.text_for_node(whole)),
            default: None,
            names: BTreeSet::new(),
            default_names: BTreeSet::new(),
        },
    }
}

/// Names bound by the statements directly inside `block`.
fn top_level_declarations(parsed: &ParsedFile, block: &Node) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    for statement in named_children(block) {
        match statement.kind() {
            "lexical_declaration" | "variable_declaration" => {
                for declarator in named_children(&statement) {
                    if declarator.kind() != "variable_declarator" {
                        continue;
                    }
                    if let Some(name) = declarator.child_by_field_name("name") {
                        names.extend(collect_identifiers(parsed, name));
                    }
                }
            }
            "function_declaration"
            | "generator_function_declaration"
            | "class_declaration"
            | "abstract_class_declaration"
            | "enum_declaration" => {
                if let Some(name) = statement.child_by_field_name("name") {
                    names.insert(parsed.text_for_node(&name));
                }
            }
            _ => {}
        }
    }
    names
}

fn classify_pattern(parsed: &ParsedFile, node: &Node) -> Pattern {
    let text = parsed.text_for_node(node);
    match node.kind() {
        "identifier" => Pattern::Identifier(text),
        "object_pattern" => Pattern::Object(text),
        "array_pattern" => Pattern::Array(text),
        _ => Pattern::Unsupported(text),
    }
}

/// Whether `await` may appear where `node` sits.
///
/// CommonJS scripts (`.cjs`, `.cts`) have no top-level `await`.
fn await_allowed_at(parsed: &ParsedFile, node: &Node) -> bool {
    let mut current = node.parent();
    while let Some(ancestor) = current {
        match ancestor.kind() {
            kind if is_function_boundary(kind) || kind == "arrow_function" => {
                return has_direct_token(&ancestor, &["async"]);
            }
            "class_static_block" | "field_definition" | "public_field_definition" => {
                return false;
            }
            _ => {}
        }
        current = ancestor.parent();
    }
    !is_commonjs_script(&parsed.path)
}

fn is_commonjs_script(path: &str) -> bool {
    path.ends_with(".cjs") || path.ends_with(".cts")
}

/// Named children, skipping comments.
fn named_children<'t>(node: &Node<'t>) -> Vec<Node<'t>> {
    let mut out = Vec::new();
    for i in 0..node.named_child_count() {
        if let Some(child) = node.named_child(i) {
            if child.kind() != "comment" {
                out.push(child);
            }
        }
    }
    out
}

/// Whether one of the node's direct children is a token of one of `kinds`.
fn has_direct_token(node: &Node, kinds: &[&str]) -> bool {
    for i in 0..node.child_count() {
        if let Some(child) = node.child(i) {
            if kinds.contains(&child.kind()) {
                return true;
            }
        }
    }
    false
}

/// Depth-first search below `root` (root excluded). Subtrees whose root
/// satisfies `skip` are not entered.
fn any_descendant(
    root: Node,
    skip: &dyn Fn(&Node) -> bool,
    pred: &dyn Fn(&Node) -> bool,
) -> bool {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        for i in 0..node.child_count() {
            if let Some(child) = node.child(i) {
                if skip(&child) {
                    continue;
                }
                if pred(&child) {
                    return true;
                }
                stack.push(child);
            }
        }
    }
    false
}

fn collect_identifiers(parsed: &ParsedFile, root: Node) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if IDENTIFIER_KINDS.contains(&node.kind()) {
            names.insert(parsed.text_for_node(&node));
        }
        for i in 0..node.child_count() {
            if let Some(child) = node.child(i) {
                stack.push(child);
            }
        }
    }
    names
}
