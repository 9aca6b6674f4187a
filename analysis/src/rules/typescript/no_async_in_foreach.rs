//! Rule: async callback passed to `forEach`
//!
//! `forEach` discards whatever its callback returns. With an async callback
//! every iteration's promise is dropped: nothing waits for the work to finish
//! and rejections surface as unhandled. When it is safe to do so the call is
//! rewritten into a sequential loop over the same array.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::parse::ast::FileId;
use crate::rules::Rule;
use crate::rules::finding::RuleFinding;
use crate::semantics::SourceSemantics;
use crate::semantics::typescript::callsite::{
    Argument, Callback, CallbackBody, CallbackForm, Callee, Parameter, Pattern, Receiver,
    TsCallSite,
};
use crate::types::context::Dimension;
use crate::types::finding::{FindingKind, Severity};
use crate::types::patch::FilePatch;

/// Iteration method the rule looks for.
pub const FOREACH_METHOD: &str = "forEach";

/// Diagnostic text attached to every match.
pub const ASYNC_FOREACH_MESSAGE: &str = "An async callback inside `forEach` swallows promises. You should either convert to `for...of` syntax, or swap `forEach` for `map` and wrap in a `Promise.all`.";

/// Rule that flags `X.forEach(async ...)` and offers a loop rewrite.
#[derive(Debug)]
pub struct TypescriptNoAsyncInForEachRule {
    autofix: bool,
}

impl TypescriptNoAsyncInForEachRule {
    pub fn new() -> Self {
        Self { autofix: true }
    }

    pub fn with_autofix(mut self, autofix: bool) -> Self {
        self.autofix = autofix;
        self
    }
}

impl Default for TypescriptNoAsyncInForEachRule {
    fn default() -> Self {
        Self::new()
    }
}

/// Why a matched call was left without a fix.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SkipReason {
    #[error("the call contains syntax errors")]
    SyntaxError,
    #[error("the call's value is used")]
    ValueConsumed,
    #[error("the callee is not a property access")]
    NotAMemberCall,
    #[error("generator callbacks cannot become loop bodies")]
    Generator,
    #[error("the callback declares {0} parameters")]
    TooManyParameters(usize),
    #[error("unsupported parameter `{0}`")]
    UnsupportedParameter(String),
    #[error("the callback returns early")]
    EarlyReturn,
    #[error("the callback relies on its own function scope")]
    FunctionScope,
    #[error("`await` is not allowed where the call sits")]
    AwaitNotAllowed,
    #[error("`{0}` would shadow a name used by the array expression")]
    ShadowsReceiver(String),
    #[error("`{0}` is declared in the body and read by a parameter default")]
    ShadowsDefault(String),
    #[error("the callback declares `var` bindings")]
    VarDeclaration,
    #[error("`super` cannot be iterated directly")]
    SuperReceiver,
    #[error("the array expression has side effects and would be re-evaluated")]
    ImpureReceiver,
}

/// Match `X.forEach(<async function>, ...)` and return the callback.
///
/// Only the first argument is looked at; a `thisArg` is ignored.
pub fn is_async_foreach(call: &TsCallSite) -> Option<&Callback> {
    let Callee::Member { property, .. } = &call.callee else {
        return None;
    };
    if property != FOREACH_METHOD {
        return None;
    }
    match &call.first_argument {
        Some(Argument::Function(callback)) if callback.is_async => Some(callback),
        _ => None,
    }
}

/// Build the loop that replaces the whole call, or say why not.
///
/// One parameter that is not a destructuring pattern with a default gives
/// `for (let P of ARR) {BODY}`. Everything else gives an indexed loop:
/// `for (let I = 0; I < ARR.length; I++) {let P = ARR[I];BODY}`.
pub fn build_loop_rewrite(call: &TsCallSite, callback: &Callback) -> Result<String, SkipReason> {
    if call.has_syntax_error {
        return Err(SkipReason::SyntaxError);
    }
    if !call.is_statement {
        return Err(SkipReason::ValueConsumed);
    }
    let Callee::Member {
        receiver, links, ..
    } = &call.callee
    else {
        return Err(SkipReason::NotAMemberCall);
    };
    if receiver.text.trim() == "super" {
        return Err(SkipReason::SuperReceiver);
    }
    if callback.form == CallbackForm::Generator {
        return Err(SkipReason::Generator);
    }
    if callback.params.len() > 2 {
        return Err(SkipReason::TooManyParameters(callback.params.len()));
    }
    if let Some(param) = callback
        .params
        .iter()
        .find(|p| matches!(p.pattern, Pattern::Unsupported(_)))
    {
        return Err(SkipReason::UnsupportedParameter(param.pattern.text().to_string()));
    }
    if callback.returns_early {
        return Err(SkipReason::EarlyReturn);
    }
    if callback.uses_function_scope {
        return Err(SkipReason::FunctionScope);
    }
    if callback.contains_await && !call.await_allowed {
        return Err(SkipReason::AwaitNotAllowed);
    }
    // `var` would leak into the enclosing function
    if callback.declares_var {
        return Err(SkipReason::VarDeclaration);
    }
    // defaults move from the parameter scope into the body
    if let Some(name) = callback
        .params
        .iter()
        .flat_map(|p| p.default_names.iter())
        .find(|name| callback.declared_names.contains(*name))
    {
        return Err(SkipReason::ShadowsDefault(name.clone()));
    }
    // `for (let x of x)` reads `x` in its temporal dead zone
    if let Some(name) = callback
        .params
        .iter()
        .flat_map(|p| p.names.iter())
        .find(|name| receiver.identifiers.contains(*name))
    {
        return Err(SkipReason::ShadowsReceiver(name.clone()));
    }

    let optional = links.iter().any(|link| link.optional);
    let body = body_statement(&callback.body);

    if let [element] = callback.params.as_slice() {
        if !(element.pattern.is_destructuring() && element.default.is_some()) {
            let array = if optional {
                format!("{} ?? []", receiver.text)
            } else {
                receiver.text.clone()
            };
            let pattern = element.pattern.text();
            let prelude = match &element.default {
                Some(default) => format!("{pattern} ??= {default};"),
                None => String::new(),
            };
            return Ok(format!("for (let {pattern} of {array}) {{{prelude}{body}}}"));
        }
    }

    if !receiver.is_pure {
        return Err(SkipReason::ImpureReceiver);
    }
    // the element binding reads the array inside the body block
    if let Some(name) = callback
        .declared_names
        .iter()
        .find(|name| receiver.identifiers.contains(*name))
    {
        return Err(SkipReason::ShadowsReceiver(name.clone()));
    }

    let array = if optional {
        format!("({} ?? [])", receiver.text)
    } else {
        receiver.text.clone()
    };
    let index = match callback.params.get(1) {
        Some(Parameter {
            pattern: Pattern::Identifier(name),
            ..
        }) => name.clone(),
        _ => fresh_index_name(callback, receiver),
    };
    let prelude = match callback.params.first() {
        Some(element) => {
            let pattern = element.pattern.text();
            match &element.default {
                Some(default) => format!("let {pattern} = {array}[{index}] ?? {default};"),
                None => format!("let {pattern} = {array}[{index}];"),
            }
        }
        None => String::new(),
    };

    Ok(format!(
        "for (let {index} = 0; {index} < {array}.length; {index}++) {{{prelude}{body}}}"
    ))
}

/// `i`, or `i2`, `i3`, ... when the name is already in use.
fn fresh_index_name(callback: &Callback, receiver: &Receiver) -> String {
    let taken =
        |name: &str| callback.identifiers.contains(name) || receiver.identifiers.contains(name);

    let mut n = 1;
    loop {
        let candidate = if n == 1 {
            "i".to_string()
        } else {
            format!("i{n}")
        };
        if !taken(candidate.as_str()) {
            return candidate;
        }
        n += 1;
    }
}

fn body_statement(body: &CallbackBody) -> String {
    match body {
        CallbackBody::Block { inner } => inner.clone(),
        CallbackBody::Expression { text } if misparses_as_statement(text) => format!("({text})"),
        CallbackBody::Expression { text } => text.clone(),
    }
}

/// Expressions that would be read as a declaration at statement start.
fn misparses_as_statement(expr: &str) -> bool {
    let expr = expr.trim_start();
    if let Some(rest) = keyword_prefix(expr, "async") {
        if keyword_prefix(rest.trim_start(), "function").is_some() {
            return true;
        }
    }
    if let Some(rest) = keyword_prefix(expr, "let") {
        if rest.trim_start().starts_with('[') {
            return true;
        }
    }
    keyword_prefix(expr, "function").is_some() || keyword_prefix(expr, "class").is_some()
}

fn keyword_prefix<'a>(text: &'a str, keyword: &str) -> Option<&'a str> {
    text.strip_prefix(keyword)
        .filter(|rest| !rest.starts_with(|c: char| c.is_alphanumeric() || c == '_' || c == '$'))
}

#[async_trait]
impl Rule for TypescriptNoAsyncInForEachRule {
    fn id(&self) -> &'static str {
        "typescript.no_async_in_foreach"
    }

    fn name(&self) -> &'static str {
        "Async callback passed to forEach"
    }

    async fn evaluate(&self, semantics: &[(FileId, Arc<SourceSemantics>)]) -> Vec<RuleFinding> {
        let mut findings = Vec::new();

        for (file_id, sem) in semantics {
            let Some(ts) = sem.as_typescript() else {
                continue;
            };

            for call in &ts.calls {
                let Some(callback) = is_async_foreach(call) else {
                    continue;
                };

                let receiver = match &call.callee {
                    Callee::Member { receiver, .. } => receiver.text.as_str(),
                    _ => "",
                };

                let patch = if self.autofix {
                    match build_loop_rewrite(call, callback) {
                        Ok(rewrite) => Some(FilePatch::replace(
                            *file_id,
                            call.start_byte,
                            call.end_byte,
                            rewrite,
                        )),
                        Err(reason) => {
                            tracing::debug!(
                                path = %ts.path,
                                line = call.location.range.start_line + 1,
                                %reason,
                                "no loop rewrite for async forEach"
                            );
                            None
                        }
                    }
                } else {
                    None
                };

                let fix_preview = patch
                    .as_ref()
                    .and_then(|p| p.hunks.first())
                    .map(|h| h.replacement.clone());

                let description = format!(
                    "`{receiver}.forEach` ignores the promise returned by each call of the async callback. \
                     Nothing waits for the iterations to finish and a rejection in any of them goes unhandled. \
                     Use a `for...of` loop to run them in sequence, or `await Promise.all({receiver}.map(...))` \
                     to run them concurrently."
                );

                findings.push(RuleFinding {
                    rule_id: self.id().to_string(),
                    title: ASYNC_FOREACH_MESSAGE.to_string(),
                    description: Some(description),
                    kind: FindingKind::BehaviorThreat,
                    severity: Severity::High,
                    confidence: 0.9,
                    dimension: Dimension::Correctness,
                    file_id: *file_id,
                    file_path: ts.path.clone(),
                    line: Some(call.location.range.start_line + 1),
                    column: Some(call.location.range.start_col + 1),
                    end_line: Some(call.location.range.end_line + 1),
                    end_column: Some(call.location.range.end_col + 1),
                    byte_range: Some((call.start_byte, call.end_byte)),
                    patch,
                    fix_preview,
                    tags: vec![
                        "typescript".into(),
                        "async".into(),
                        "promise".into(),
                        "correctness".into(),
                    ],
                });
            }
        }

        tracing::debug!(count = findings.len(), "async forEach findings");
        findings
    }
}
