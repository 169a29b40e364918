//! Tree-walking interpreter: evaluates a block's tokens against an operand
//! stack, resolving identifiers, binding parameters, and honoring lexical
//! variable scoping and `if`/`while` control flow.
//!
//! The global heap is shared mutable state across every invocation for the
//! lifetime of the program, while each function invocation gets its own
//! private function heap. Rather than threading two disjoint lifetimes
//! through every recursive call (which forces either unsafe aliasing tricks
//! or a lifetime-parameterized "reborrow" enum), the global heap is held
//! behind a `RefCell` and passed down by shared reference: only `_global`'s
//! own `let`/typed declarations ever borrow it mutably, and recursive calls
//! only ever need read access to it (step 3 of identifier resolution).

use std::cell::RefCell;
use std::ops::Range;

use numen_core::{Keyword, NumenError, NumenResult, TypeName, Value};

use crate::block::{BlockTable, Heap, Parameter, GLOBAL};
use crate::builtins;

/// Evaluates a parsed program: runs `_global`, then `main` if present, each
/// against a fresh, empty caller stack.
pub struct Interpreter<'t> {
    table: &'t BlockTable,
}

impl<'t> Interpreter<'t> {
    pub fn new(table: &'t BlockTable) -> Self {
        Interpreter { table }
    }

    pub fn run(&self) -> NumenResult<()> {
        let global_heap = RefCell::new(Heap::new());
        self.run_root(GLOBAL, &global_heap)?;
        if self.table.contains_key("main") {
            self.run_root("main", &global_heap)?;
        }
        Ok(())
    }

    fn run_root(&self, name: &str, global_heap: &RefCell<Heap>) -> NumenResult<()> {
        let mut caller_stack = Vec::new();
        self.invoke(name, &mut caller_stack, global_heap)?;
        if !caller_stack.is_empty() {
            return Err(NumenError::ReturnFromRoot {
                block: name.to_string(),
                remaining: caller_stack.len(),
            });
        }
        Ok(())
    }

    /// Invoke a named block against the caller's stack: binds parameters
    /// (consuming from `caller_stack` in reverse source order), then
    /// evaluates the block's body against a fresh context stack.
    fn invoke(
        &self,
        name: &str,
        caller_stack: &mut Vec<Value>,
        global_heap: &RefCell<Heap>,
    ) -> NumenResult<()> {
        let block = self
            .table
            .get(name)
            .ok_or_else(|| NumenError::name_error(format!("call to undefined block '{name}'")))?;

        let mut function_heap = Heap::new();
        let mut prelude: Vec<Value> = Vec::new();
        for param in block.parameters.iter().rev() {
            let value = caller_stack.pop().ok_or_else(|| {
                NumenError::stack_underflow(format!("parameter binding for '{name}'"))
            })?;
            match param {
                Parameter::Typed(expected) => {
                    if !expected.matches(&value) {
                        return Err(NumenError::type_error(format!(
                            "parameter of '{name}' expects {expected}, got {} ('{value}')",
                            value.kind_name()
                        )));
                    }
                    prelude.push(value);
                }
                Parameter::Identifier(param_name) => {
                    function_heap.insert(param_name.clone(), value);
                }
            }
        }
        prelude.reverse();

        let mut tokens = prelude;
        tokens.extend(block.body.iter().cloned());

        let mut context = Vec::new();
        self.evaluate(&tokens, &mut context, &mut function_heap, global_heap, caller_stack, name)
    }

    #[allow(clippy::too_many_arguments)]
    fn evaluate(
        &self,
        tokens: &[Value],
        context: &mut Vec<Value>,
        function_heap: &mut Heap,
        global_heap: &RefCell<Heap>,
        caller_stack: &mut Vec<Value>,
        block_name: &str,
    ) -> NumenResult<()> {
        let mut i = 0;
        while i < tokens.len() {
            let token = &tokens[i];
            match token {
                Value::Function(name) => {
                    builtins::call(name, context, caller_stack)?;
                    i += 1;
                }
                Value::Int(_) | Value::Float(_) | Value::Bool(_) | Value::String(_) => {
                    context.push(token.clone());
                    i += 1;
                }
                Value::Identifier(name) => {
                    // An identifier immediately followed by `let` or a typed
                    // declaration is always a binding *name*, never a value
                    // reference — even when a binding of the same name
                    // already exists (rebinding a loop counter, say). Resolve
                    // it as a value here and `let`/the typed-declaration
                    // could never tell "fresh name" from "already bound",
                    // since the normal lookup chain below has no way to
                    // leave the raw identifier on the stack once the name
                    // resolves to something.
                    let names_a_binding = matches!(
                        tokens.get(i + 1),
                        Some(Value::Keyword(Keyword::Let)) | Some(Value::Type(_))
                    );
                    if names_a_binding {
                        context.push(token.clone());
                    } else if self.table.contains_key(name) {
                        self.invoke(name, context, global_heap)?;
                    } else if let Some(v) = function_heap.get(name) {
                        context.push(v.clone());
                    } else if let Some(v) = global_heap.borrow().get(name) {
                        context.push(v.clone());
                    } else {
                        context.push(token.clone());
                    }
                    i += 1;
                }
                Value::Keyword(Keyword::Let) => {
                    bind(context, "let", None, block_name, function_heap, global_heap)?;
                    i += 1;
                }
                Value::Type(expected) => {
                    bind(
                        context,
                        "type declaration",
                        Some(*expected),
                        block_name,
                        function_heap,
                        global_heap,
                    )?;
                    i += 1;
                }
                Value::Keyword(Keyword::If) | Value::Keyword(Keyword::Iff) => {
                    let cond = context.pop().ok_or_else(|| NumenError::stack_underflow("if"))?;
                    let cond = cond.as_bool().ok_or_else(|| {
                        NumenError::type_error(format!(
                            "condition before 'if'/'iff' is not a bool ('{cond}')"
                        ))
                    })?;
                    let (then_range, else_range, end_index) = scan_if(tokens, i + 1)?;
                    if cond {
                        let mut branch_ctx = Vec::new();
                        self.evaluate(
                            &tokens[then_range],
                            &mut branch_ctx,
                            function_heap,
                            global_heap,
                            caller_stack,
                            block_name,
                        )?;
                        context.append(&mut branch_ctx);
                    } else if let Some(else_range) = else_range {
                        let mut branch_ctx = Vec::new();
                        self.evaluate(
                            &tokens[else_range],
                            &mut branch_ctx,
                            function_heap,
                            global_heap,
                            caller_stack,
                            block_name,
                        )?;
                        context.append(&mut branch_ctx);
                    }
                    i = end_index + 1;
                }
                Value::Keyword(Keyword::While) => {
                    let (cond_range, body_range, end_index) = scan_while(tokens, i + 1)?;
                    loop {
                        let mut cond_ctx = Vec::new();
                        self.evaluate(
                            &tokens[cond_range.clone()],
                            &mut cond_ctx,
                            function_heap,
                            global_heap,
                            caller_stack,
                            block_name,
                        )?;
                        let test = cond_ctx
                            .pop()
                            .ok_or_else(|| NumenError::stack_underflow("while condition"))?;
                        let test = test.as_bool().ok_or_else(|| {
                            NumenError::type_error(format!(
                                "'while' condition is not a bool ('{test}')"
                            ))
                        })?;
                        if !test {
                            break;
                        }
                        let mut body_ctx = Vec::new();
                        self.evaluate(
                            &tokens[body_range.clone()],
                            &mut body_ctx,
                            function_heap,
                            global_heap,
                            caller_stack,
                            block_name,
                        )?;
                        context.append(&mut body_ctx);
                    }
                    i = end_index + 1;
                }
                // Any other keyword reached here (`end`/`else`/`do`/`as`, or
                // the reserved no-op `var`/`import`/`fun` spellings) has no
                // interpreter rule of its own: it falls through and is
                // pushed as a plain value, exactly like an unresolved
                // identifier.
                other => {
                    context.push(other.clone());
                    i += 1;
                }
            }
        }
        Ok(())
    }
}

/// Shared implementation of `let` and typed declarations: pop a binding
/// name then a value off `context`, optionally type-check the value, and
/// write it into the appropriate heap — the global heap while evaluating
/// `_global`, the function heap everywhere else.
fn bind(
    context: &mut Vec<Value>,
    op_name: &str,
    expected: Option<TypeName>,
    block_name: &str,
    function_heap: &mut Heap,
    global_heap: &RefCell<Heap>,
) -> NumenResult<()> {
    let name_value = context.pop().ok_or_else(|| NumenError::stack_underflow(op_name))?;
    let name = name_value
        .as_identifier()
        .ok_or_else(|| {
            NumenError::type_error(format!("'{op_name}' expected an identifier, got '{name_value}'"))
        })?
        .to_string();
    let value = context.pop().ok_or_else(|| NumenError::stack_underflow(op_name))?;

    if let Some(expected) = expected {
        if !expected.matches(&value) {
            return Err(NumenError::type_error(format!(
                "declaration of '{name}' expects {expected}, got {} ('{value}')",
                value.kind_name()
            )));
        }
    }

    if block_name == GLOBAL {
        global_heap.borrow_mut().insert(name, value);
    } else {
        function_heap.insert(name, value);
    }
    Ok(())
}

fn is_eval_opener(value: &Value) -> bool {
    matches!(value, Value::Keyword(Keyword::If) | Value::Keyword(Keyword::Iff) | Value::Keyword(Keyword::While))
}

fn is_end(value: &Value) -> bool {
    matches!(value, Value::Keyword(Keyword::End))
}

fn is_else(value: &Value) -> bool {
    matches!(value, Value::Keyword(Keyword::Else))
}

fn is_do(value: &Value) -> bool {
    matches!(value, Value::Keyword(Keyword::Do))
}

/// Scan forward from just after an `if`/`iff` token to find the then-branch,
/// the optional else-branch, and the index of the terminating `end`.
fn scan_if(
    tokens: &[Value],
    start: usize,
) -> NumenResult<(Range<usize>, Option<Range<usize>>, usize)> {
    let mut depth = 0i32;
    let mut idx = start;
    loop {
        let tok = tokens
            .get(idx)
            .ok_or_else(|| NumenError::parse_no_pos("unterminated 'if': missing matching 'end'"))?;
        if is_eval_opener(tok) {
            depth += 1;
        } else if is_end(tok) {
            if depth == 0 {
                return Ok((start..idx, None, idx));
            }
            depth -= 1;
        } else if is_else(tok) && depth == 0 {
            let then_end = idx;
            let else_start = idx + 1;
            let mut depth2 = 0i32;
            let mut j = else_start;
            loop {
                let t2 = tokens.get(j).ok_or_else(|| {
                    NumenError::parse_no_pos("unterminated 'else': missing matching 'end'")
                })?;
                if is_eval_opener(t2) {
                    depth2 += 1;
                } else if is_end(t2) {
                    if depth2 == 0 {
                        return Ok((start..then_end, Some(else_start..j), j));
                    }
                    depth2 -= 1;
                }
                j += 1;
            }
        }
        idx += 1;
    }
}

/// Scan forward from just after a `while` token to find the condition
/// sub-sequence (up to the matching `do`), the body sub-sequence (up to the
/// matching `end`), and the index of that `end`.
fn scan_while(tokens: &[Value], start: usize) -> NumenResult<(Range<usize>, Range<usize>, usize)> {
    let mut depth = 0i32;
    let mut idx = start;
    let do_index = loop {
        let tok = tokens
            .get(idx)
            .ok_or_else(|| NumenError::parse_no_pos("unterminated 'while': missing 'do'"))?;
        if is_eval_opener(tok) {
            depth += 1;
        } else if is_end(tok) {
            depth -= 1;
        } else if is_do(tok) && depth == 0 {
            break idx;
        }
        idx += 1;
    };

    let body_start = do_index + 1;
    let mut depth2 = 0i32;
    let mut j = body_start;
    let end_index = loop {
        let tok = tokens.get(j).ok_or_else(|| {
            NumenError::parse_no_pos("unterminated 'while': missing matching 'end'")
        })?;
        if is_eval_opener(tok) {
            depth2 += 1;
        } else if is_end(tok) {
            if depth2 == 0 {
                break j;
            }
            depth2 -= 1;
        }
        j += 1;
    };

    Ok((start..do_index, body_start..end_index, end_index))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_program;

    fn run_ok(source: &str) {
        let table = parse_program(source).unwrap();
        Interpreter::new(&table).run().unwrap();
    }

    fn run_err(source: &str) -> NumenError {
        let table = parse_program(source).unwrap();
        Interpreter::new(&table).run().unwrap_err()
    }

    #[test]
    fn scope_isolation_function_heap_is_private() {
        // `y` bound inside `f` is local to `f`'s own function heap; `f`
        // returning must not disturb the unrelated global `x`.
        run_ok(
            r#"
            10 x let
            fun f as 1 y let y print end
            f
            x print
            "#,
        );
    }

    #[test]
    fn let_can_rebind_an_already_bound_name() {
        // the name token directly before `let` is always treated as a
        // binding name, even when `i` already has a value bound.
        run_ok("0 i let i 1 + i let i print");
    }

    #[test]
    fn global_let_is_visible_to_later_functions() {
        run_ok(
            r#"
            7 g let
            fun reader as g print end
            reader
            "#,
        );
    }

    #[test]
    fn function_heap_does_not_leak_into_global_heap() {
        // a function's own `let` must not be visible from `_global` later.
        let err = run_err(
            r#"
            fun f as 1 x let end
            f
            x print
            "#,
        );
        // unresolved `x` is pushed as an identifier value, which `print` rejects
        assert!(matches!(err, NumenError::Type { .. }));
    }

    #[test]
    fn ret_from_global_or_main_is_fatal() {
        let err = run_err("1 ret");
        assert!(matches!(err, NumenError::ReturnFromRoot { .. }));
    }

    #[test]
    fn typed_parameter_type_checks_and_identifier_binds() {
        run_ok("fun sq n as n n * ret end 4 sq print");
    }

    #[test]
    fn if_else_selects_correct_branch() {
        run_ok(r#"5 3 > if "yes" print else "no" print end"#);
    }

    #[test]
    fn while_loop_executes_until_condition_false() {
        run_ok("0 i let while i 5 < do i print i 1 + i let end");
    }

    #[test]
    fn nested_if_inside_while_body_is_scanned_correctly() {
        run_ok(
            r#"
            0 i let
            while i 3 < do
                i 1 % 0 == if "even" print else "odd" print end
                i 1 + i let
            end
            "#,
        );
    }

    #[test]
    fn undefined_call_falls_back_to_identifier_value() {
        let err = run_err("undefined_name print");
        assert!(matches!(err, NumenError::Type { .. }));
    }
}
