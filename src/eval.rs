// ABOUTME: Tree-walking evaluator — dispatches on node kind, threads the module cache

use crate::ast::{
    AssignOp, Block, Expr, ExprKind, InfixOp, Position, Program, Stmt, StmtKind, UnaryOp,
};
use crate::builtins;
use crate::builtins::strings;
use crate::env::Environment;
use crate::frontend;
use crate::value::{Function, HashPair, Module, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

fn make_error(message: impl Into<String>) -> Value {
    Value::Error(message.into())
}

fn unwrap_return(value: Value) -> Value {
    match value {
        Value::Return(inner) => *inner,
        other => other,
    }
}

/// The evaluator owns the module cache and the current module directory.
///
/// Both are fields rather than globals so separate evaluators (one per REPL
/// session, one per test) never share state. The module directory is swapped
/// while a nested import evaluates and restored afterwards, also on error.
pub struct Evaluator {
    modules: HashMap<PathBuf, Rc<Module>>,
    module_dir: PathBuf,
}

impl Evaluator {
    pub fn new(module_dir: PathBuf) -> Self {
        Evaluator {
            modules: HashMap::new(),
            module_dir,
        }
    }

    /// Seeds the cache with an already-evaluating module. The shim registers
    /// the entry file this way, so a script importing its own path resolves
    /// to the module that is currently running.
    pub fn register_module(&mut self, path: PathBuf, env: Rc<Environment>) {
        let module = Rc::new(Module {
            path: path.clone(),
            env,
        });
        self.modules.insert(path, module);
    }

    /// Evaluates a program, returning the last statement's result and
    /// short-circuiting on errors.
    pub fn eval_program(&mut self, program: &Program, env: &Rc<Environment>) -> Value {
        let mut result = Value::Null;
        for stmt in &program.statements {
            result = self.eval_stmt(stmt, env);
            if result.is_error() {
                return result;
            }
        }
        result
    }

    // A block opens a fresh scope and propagates any signal unchanged.
    fn eval_block(&mut self, block: &Block, env: &Rc<Environment>) -> Value {
        let block_env = Environment::enclosing(env.clone());
        let mut result = Value::Null;
        for stmt in &block.statements {
            result = self.eval_stmt(stmt, &block_env);
            if result.is_error() || result.is_return() || result.is_break() || result.is_continue()
            {
                return result;
            }
        }
        result
    }

    fn eval_stmt(&mut self, stmt: &Stmt, env: &Rc<Environment>) -> Value {
        match &stmt.kind {
            StmtKind::Expression(expr) => self.eval_expr(expr, env),
            StmtKind::Let { name, value } => {
                let value = self.eval_expr(value, env);
                if value.is_error() {
                    return value;
                }
                if !env.add(name, value) {
                    return make_error(format!("cannot define variable {}", name));
                }
                Value::Null
            }
            StmtKind::Const { name, value } => {
                let value = self.eval_expr(value, env);
                if value.is_error() {
                    return value;
                }
                if !env.add_const(name, value) {
                    return make_error(format!("cannot define constant {}", name));
                }
                Value::Null
            }
            StmtKind::If {
                cond,
                then,
                otherwise,
            } => {
                let cond = self.eval_expr(cond, env);
                if cond.is_error() {
                    return cond;
                }
                if cond.is_truthy() {
                    self.eval_block(then, env)
                } else {
                    self.eval_block(otherwise, env)
                }
            }
            StmtKind::While { head, body } => self.eval_while(head, body, env),
            StmtKind::RangeLoop {
                binder,
                range,
                body,
            } => self.eval_range_loop(binder, range, body, env),
            StmtKind::KeyValueLoop {
                key_binder,
                value_binder,
                range,
                body,
            } => self.eval_key_value_loop(key_binder, value_binder, range, body, env),
            StmtKind::Return(expr) => {
                let result = self.eval_expr(expr, env);
                if result.is_error() {
                    return result;
                }
                Value::Return(Box::new(result))
            }
            StmtKind::Break => Value::Break,
            StmtKind::Continue => Value::Continue,
            StmtKind::TryCatch {
                try_block,
                binder,
                catch_block,
            } => self.eval_try_catch(try_block, binder, catch_block, env),
            StmtKind::Import { path, alias } => self.eval_import(path, alias, env),
        }
    }

    fn eval_while(&mut self, head: &Expr, body: &Block, env: &Rc<Environment>) -> Value {
        loop {
            let cond = self.eval_expr(head, env);
            if cond.is_error() {
                return cond;
            }
            if !cond.is_truthy() {
                return Value::Null;
            }

            let result = self.eval_block(body, env);
            if result.is_error() || result.is_return() {
                return result;
            }
            if result.is_break() {
                return Value::Null;
            }
            // A continue signal (like a normal result) just starts the next turn.
        }
    }

    fn eval_range_loop(
        &mut self,
        binder: &str,
        range: &Expr,
        body: &Block,
        env: &Rc<Environment>,
    ) -> Value {
        let range_value = self.eval_expr(range, env);
        if range_value.is_error() {
            return range_value;
        }

        let loop_env = Environment::enclosing(env.clone());
        loop_env.add(binder, Value::Null);

        match range_value {
            Value::Array(elements) => {
                let snapshot: Vec<Value> = elements.borrow().clone();
                for element in snapshot {
                    loop_env.set(binder, element);
                    let result = self.eval_block(body, &loop_env);
                    if result.is_error() || result.is_return() {
                        return result;
                    }
                    if result.is_break() {
                        return Value::Null;
                    }
                }
                Value::Null
            }
            Value::Hash(pairs) => {
                let keys: Vec<Value> = pairs.borrow().values().map(|p| p.key.clone()).collect();
                for key in keys {
                    loop_env.set(binder, key);
                    let result = self.eval_block(body, &loop_env);
                    if result.is_error() || result.is_return() {
                        return result;
                    }
                    if result.is_break() {
                        return Value::Null;
                    }
                }
                Value::Null
            }
            other => make_error(format!(
                "can only range over array or hash, got {}",
                other.type_name()
            )),
        }
    }

    fn eval_key_value_loop(
        &mut self,
        key_binder: &str,
        value_binder: &str,
        range: &Expr,
        body: &Block,
        env: &Rc<Environment>,
    ) -> Value {
        let range_value = self.eval_expr(range, env);
        if range_value.is_error() {
            return range_value;
        }

        let loop_env = Environment::enclosing(env.clone());
        loop_env.add(key_binder, Value::Null);
        loop_env.add(value_binder, Value::Null);

        match range_value {
            Value::Array(elements) => {
                let snapshot: Vec<Value> = elements.borrow().clone();
                for (index, element) in snapshot.into_iter().enumerate() {
                    loop_env.set(key_binder, Value::Integer(index as i64));
                    loop_env.set(value_binder, element);
                    let result = self.eval_block(body, &loop_env);
                    if result.is_error() || result.is_return() {
                        return result;
                    }
                    if result.is_break() {
                        return Value::Null;
                    }
                }
                Value::Null
            }
            Value::Hash(pairs) => {
                let snapshot: Vec<(Value, Value)> = pairs
                    .borrow()
                    .values()
                    .map(|p| (p.key.clone(), p.value.clone()))
                    .collect();
                for (key, value) in snapshot {
                    loop_env.set(key_binder, key);
                    loop_env.set(value_binder, value);
                    let result = self.eval_block(body, &loop_env);
                    if result.is_error() || result.is_return() {
                        return result;
                    }
                    if result.is_break() {
                        return Value::Null;
                    }
                }
                Value::Null
            }
            other => make_error(format!(
                "can only range over array or hash, got {}",
                other.type_name()
            )),
        }
    }

    fn eval_try_catch(
        &mut self,
        try_block: &Block,
        binder: &str,
        catch_block: &Block,
        env: &Rc<Environment>,
    ) -> Value {
        let tried = self.eval_block(try_block, env);
        if tried.is_return() || tried.is_break() || tried.is_continue() {
            return tried;
        }

        match tried {
            // Parser-error bundles are not catchable.
            Value::ParserErrors(_) => tried,
            Value::Error(message) => {
                let catch_env = Environment::enclosing(env.clone());
                catch_env.add(binder, Value::String(message));
                let caught = self.eval_block(catch_block, &catch_env);
                if caught.is_error()
                    || caught.is_return()
                    || caught.is_break()
                    || caught.is_continue()
                {
                    return caught;
                }
                Value::Null
            }
            _ => Value::Null,
        }
    }

    fn eval_import(&mut self, path: &str, alias: &str, env: &Rc<Environment>) -> Value {
        let resolved = self.resolve_module_path(path);

        if let Some(module) = self.modules.get(&resolved) {
            let module = module.clone();
            if !env.add_const(alias, Value::Module(module)) {
                return make_error("cannot define module with this name, it is already taken");
            }
            return Value::Null;
        }

        let parent = resolved
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.module_dir.clone());
        let saved_dir = std::mem::replace(&mut self.module_dir, parent);
        let result = self.load_module(&resolved, alias, env);
        self.module_dir = saved_dir;
        result
    }

    fn resolve_module_path(&self, path: &str) -> PathBuf {
        let path = Path::new(path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.module_dir.join(path)
        }
    }

    fn load_module(&mut self, path: &Path, alias: &str, env: &Rc<Environment>) -> Value {
        let program = match frontend::build(path) {
            Ok(program) => program,
            Err(diagnostics) => return Value::ParserErrors(Rc::new(diagnostics)),
        };

        let module = Rc::new(Module {
            path: path.to_path_buf(),
            env: Environment::new(),
        });
        if !env.add_const(alias, Value::Module(module.clone())) {
            return make_error("cannot define module with this name, it is already taken");
        }

        // The cache entry lands before evaluation, so an import cycle
        // resolves to the partially-populated module instead of recursing.
        self.modules.insert(path.to_path_buf(), module.clone());
        let module_env = module.env.clone();
        self.eval_program(&program, &module_env)
    }

    // ===== expressions =====

    fn eval_expr(&mut self, expr: &Expr, env: &Rc<Environment>) -> Value {
        match &expr.kind {
            ExprKind::Integer(value) => Value::Integer(*value),
            ExprKind::Float(value) => Value::Float(*value),
            ExprKind::Boolean(value) => Value::Boolean(*value),
            ExprKind::String(value) => Value::String(value.clone()),
            ExprKind::Null => Value::Null,
            ExprKind::Identifier(name) => eval_identifier(name, env),
            ExprKind::Unary { op, operand } => self.eval_unary(*op, operand, env),
            ExprKind::Infix { op, lhs, rhs } => self.eval_infix(*op, lhs, rhs, env),
            ExprKind::Conditional {
                cond,
                then,
                otherwise,
            } => {
                let cond = self.eval_expr(cond, env);
                if cond.is_error() {
                    return cond;
                }
                if cond.is_truthy() {
                    self.eval_expr(then, env)
                } else {
                    self.eval_expr(otherwise, env)
                }
            }
            ExprKind::Function { parameters, body } => Value::Function(Rc::new(Function {
                parameters: parameters.clone(),
                body: body.clone(),
                env: env.clone(),
            })),
            ExprKind::Call { callee, arguments } => self.eval_call(callee, arguments, env),
            ExprKind::Array(elements) => match self.eval_expressions(elements, env) {
                Ok(elements) => Value::array(elements),
                Err(err) => err,
            },
            ExprKind::Hash(pairs) => self.eval_hash_literal(pairs, env),
            ExprKind::Index { container, index } => {
                let container = self.eval_expr(container, env);
                if container.is_error() {
                    return container;
                }
                let index = self.eval_expr(index, env);
                if index.is_error() {
                    return index;
                }
                eval_index(container, index)
            }
            ExprKind::Assign { target, op, value } => {
                self.eval_assign(target, *op, value, env, expr.pos)
            }
        }
    }

    fn eval_expressions(
        &mut self,
        exprs: &[Expr],
        env: &Rc<Environment>,
    ) -> Result<Vec<Value>, Value> {
        let mut values = Vec::with_capacity(exprs.len());
        for expr in exprs {
            let value = self.eval_expr(expr, env);
            if value.is_error() {
                return Err(value);
            }
            values.push(value);
        }
        Ok(values)
    }

    fn eval_unary(&mut self, op: UnaryOp, operand: &Expr, env: &Rc<Environment>) -> Value {
        let value = self.eval_expr(operand, env);
        if value.is_error() {
            return value;
        }

        match op {
            UnaryOp::Not => Value::Boolean(!value.is_truthy()),
            UnaryOp::Pos => match value {
                Value::Integer(_) | Value::Float(_) => value,
                other => make_error(format!(
                    "unsupported operand for unary +: {}",
                    other.type_name()
                )),
            },
            UnaryOp::Neg => match value {
                Value::Integer(value) => Value::Integer(value.wrapping_neg()),
                Value::Float(value) => Value::Float(-value),
                other => make_error(format!(
                    "unsupported operand for unary -: {}",
                    other.type_name()
                )),
            },
        }
    }

    fn eval_infix(&mut self, op: InfixOp, lhs: &Expr, rhs: &Expr, env: &Rc<Environment>) -> Value {
        // The logical operators and `??` evaluate their right side lazily.
        match op {
            InfixOp::And => {
                let lhs = self.eval_expr(lhs, env);
                if lhs.is_error() {
                    return lhs;
                }
                if !lhs.is_truthy() {
                    return Value::Boolean(false);
                }
                let rhs = self.eval_expr(rhs, env);
                if rhs.is_error() {
                    return rhs;
                }
                return Value::Boolean(rhs.is_truthy());
            }
            InfixOp::Or => {
                let lhs = self.eval_expr(lhs, env);
                if lhs.is_error() {
                    return lhs;
                }
                if lhs.is_truthy() {
                    return Value::Boolean(true);
                }
                let rhs = self.eval_expr(rhs, env);
                if rhs.is_error() {
                    return rhs;
                }
                return Value::Boolean(rhs.is_truthy());
            }
            InfixOp::NullCoalesce => {
                let lhs = self.eval_expr(lhs, env);
                if lhs.is_error() {
                    return lhs;
                }
                if matches!(lhs, Value::Null) {
                    return self.eval_expr(rhs, env);
                }
                return lhs;
            }
            _ => {}
        }

        let lhs = self.eval_expr(lhs, env);
        if lhs.is_error() {
            return lhs;
        }
        let rhs = self.eval_expr(rhs, env);
        if rhs.is_error() {
            return rhs;
        }

        match (lhs, rhs) {
            (Value::Integer(lhs), Value::Integer(rhs)) => eval_integer_infix(op, lhs, rhs),
            (Value::Float(lhs), Value::Float(rhs)) => eval_float_infix(op, lhs, rhs),
            (Value::String(lhs), Value::String(rhs)) => eval_string_infix(op, &lhs, &rhs),
            (lhs, rhs) if lhs.type_name() == rhs.type_name() => match op {
                InfixOp::Eq => Value::Boolean(lhs.identity_eq(&rhs)),
                InfixOp::NotEq => Value::Boolean(!lhs.identity_eq(&rhs)),
                _ => make_error("unsupported infix expression"),
            },
            (lhs, rhs) => match op {
                InfixOp::Eq => Value::Boolean(lhs.identity_eq(&rhs)),
                InfixOp::NotEq => Value::Boolean(!lhs.identity_eq(&rhs)),
                _ => make_error("operands of infix expressions need to be of the same type"),
            },
        }
    }

    fn eval_call(&mut self, callee: &Expr, arguments: &[Expr], env: &Rc<Environment>) -> Value {
        let function = self.eval_expr(callee, env);
        if function.is_error() {
            return function;
        }
        let args = match self.eval_expressions(arguments, env) {
            Ok(args) => args,
            Err(err) => return err,
        };
        self.apply_function(function, args)
    }

    fn apply_function(&mut self, function: Value, args: Vec<Value>) -> Value {
        match function {
            Value::Function(function) => {
                if args.len() < function.parameters.len() {
                    return make_error(format!(
                        "wrong number of arguments: want {}, got {}",
                        function.parameters.len(),
                        args.len()
                    ));
                }
                // Parameters bind const in a fresh scope enclosing the
                // captured environment; excess arguments are ignored.
                let call_env = Environment::enclosing(function.env.clone());
                for (parameter, argument) in function.parameters.iter().zip(args) {
                    call_env.add_const(parameter, argument);
                }
                let result = self.eval_block(&function.body, &call_env);
                unwrap_return(result)
            }
            Value::Builtin(builtin) => match (builtin.func)(&args) {
                Ok(value) => value,
                Err(err) => make_error(err.to_string()),
            },
            other => make_error(format!("cannot call a non function {}", other.type_name())),
        }
    }

    fn eval_hash_literal(&mut self, pairs: &[(Expr, Expr)], env: &Rc<Environment>) -> Value {
        let mut map = HashMap::new();
        for (key_expr, value_expr) in pairs {
            let key = self.eval_expr(key_expr, env);
            if key.is_error() {
                return key;
            }
            let hash_key = match key.hash_key() {
                Some(hash_key) => hash_key,
                None => return make_error(format!("key is not hashable: {}", key.type_name())),
            };

            let value = self.eval_expr(value_expr, env);
            if value.is_error() {
                return value;
            }
            map.insert(hash_key, HashPair { key, value });
        }
        Value::hash(map)
    }

    fn eval_assign(
        &mut self,
        target: &Expr,
        op: AssignOp,
        value: &Expr,
        env: &Rc<Environment>,
        pos: Position,
    ) -> Value {
        // Compound assignment desugars to `target = target OP value` and
        // re-enters plain assignment, re-evaluating the target expression.
        if let Some(infix) = op.desugared() {
            let desugared = Expr {
                kind: ExprKind::Infix {
                    op: infix,
                    lhs: Box::new(target.clone()),
                    rhs: Box::new(value.clone()),
                },
                pos,
            };
            return self.eval_plain_assign(target, &desugared, env);
        }
        self.eval_plain_assign(target, value, env)
    }

    fn eval_plain_assign(&mut self, target: &Expr, value: &Expr, env: &Rc<Environment>) -> Value {
        match &target.kind {
            ExprKind::Identifier(name) => {
                let rhs = self.eval_expr(value, env);
                if rhs.is_error() {
                    return rhs;
                }
                if !env.set(name, rhs.clone()) {
                    return make_error(format!("cannot assign {}", name));
                }
                rhs
            }
            ExprKind::Index { container, index } => {
                let rhs = self.eval_expr(value, env);
                if rhs.is_error() {
                    return rhs;
                }
                self.eval_index_set(container, index, rhs, env)
            }
            _ => make_error("can only assign to variables"),
        }
    }

    fn eval_index_set(
        &mut self,
        container: &Expr,
        index: &Expr,
        value: Value,
        env: &Rc<Environment>,
    ) -> Value {
        let container = self.eval_expr(container, env);
        if container.is_error() {
            return container;
        }
        let index = self.eval_expr(index, env);
        if index.is_error() {
            return index;
        }

        match container {
            Value::Array(elements) => match index {
                Value::Integer(i) => {
                    let mut elements = elements.borrow_mut();
                    if i < 0 || i >= elements.len() as i64 {
                        return make_error(format!("index out of bounds: {}", i));
                    }
                    elements[i as usize] = value.clone();
                    value
                }
                other => make_error(format!(
                    "can only use integer as array index, got {}",
                    other.type_name()
                )),
            },
            Value::Hash(pairs) => match index.hash_key() {
                Some(hash_key) => {
                    pairs.borrow_mut().insert(
                        hash_key,
                        HashPair {
                            key: index,
                            value: value.clone(),
                        },
                    );
                    value
                }
                None => make_error(format!("cannot use {} as hash key", index.type_name())),
            },
            Value::Module(_) => make_error("cannot assign into a module"),
            other => make_error(format!(
                "cannot use index expression on {}",
                other.type_name()
            )),
        }
    }
}

fn eval_identifier(name: &str, env: &Rc<Environment>) -> Value {
    if let Some(value) = env.get(name) {
        return value;
    }
    if let Some(builtin) = builtins::lookup(name) {
        return Value::Builtin(builtin);
    }
    make_error(format!("unknown identifier: {}", name))
}

fn eval_index(container: Value, index: Value) -> Value {
    match container {
        Value::Array(elements) => match index {
            Value::Integer(i) => {
                let elements = elements.borrow();
                if i < 0 || i >= elements.len() as i64 {
                    Value::Null
                } else {
                    elements[i as usize].clone()
                }
            }
            other => make_error(format!(
                "can only use integer as index on array, got {}",
                other.type_name()
            )),
        },
        Value::Hash(pairs) => match index.hash_key() {
            Some(hash_key) => pairs
                .borrow()
                .get(&hash_key)
                .map(|pair| pair.value.clone())
                .unwrap_or(Value::Null),
            None => make_error(format!("unusable as hash key: {}", index.type_name())),
        },
        // String indexing shares the substring bounds checks, so an
        // out-of-range index errors instead of yielding null.
        Value::String(value) => match index {
            Value::Integer(i) => match strings::slice(&value, i, i + 1) {
                Ok(slice) => slice,
                Err(err) => make_error(err.to_string()),
            },
            other => make_error(format!(
                "can only use integer as index on string, got {}",
                other.type_name()
            )),
        },
        Value::Module(module) => {
            let name = index.to_string();
            match module.env.get(&name) {
                Some(value) => value,
                None => make_error(format!("cannot find {} in module", name)),
            }
        }
        other => make_error(format!("cannot index on {}", other.type_name())),
    }
}

fn eval_integer_infix(op: InfixOp, lhs: i64, rhs: i64) -> Value {
    match op {
        InfixOp::Add => Value::Integer(lhs.wrapping_add(rhs)),
        InfixOp::Sub => Value::Integer(lhs.wrapping_sub(rhs)),
        InfixOp::Mul => Value::Integer(lhs.wrapping_mul(rhs)),
        InfixOp::Div => {
            if rhs == 0 {
                make_error("division by zero")
            } else {
                Value::Integer(lhs.wrapping_div(rhs))
            }
        }
        InfixOp::Mod => {
            if rhs == 0 {
                make_error("modulo by zero")
            } else {
                Value::Integer(lhs.wrapping_rem(rhs))
            }
        }
        InfixOp::Lt => Value::Boolean(lhs < rhs),
        InfixOp::Gt => Value::Boolean(lhs > rhs),
        InfixOp::LtEq => Value::Boolean(lhs <= rhs),
        InfixOp::GtEq => Value::Boolean(lhs >= rhs),
        InfixOp::Eq => Value::Boolean(lhs == rhs),
        InfixOp::NotEq => Value::Boolean(lhs != rhs),
        // Exclusive on the right end, descending when lhs > rhs.
        InfixOp::Range => {
            let mut elements = Vec::new();
            if lhs < rhs {
                for i in lhs..rhs {
                    elements.push(Value::Integer(i));
                }
            } else if lhs > rhs {
                let mut i = lhs;
                while i > rhs {
                    elements.push(Value::Integer(i));
                    i -= 1;
                }
            }
            Value::array(elements)
        }
        _ => make_error("unsupported infix operator on integers"),
    }
}

fn eval_float_infix(op: InfixOp, lhs: f64, rhs: f64) -> Value {
    match op {
        InfixOp::Add => Value::Float(lhs + rhs),
        InfixOp::Sub => Value::Float(lhs - rhs),
        InfixOp::Mul => Value::Float(lhs * rhs),
        InfixOp::Div => Value::Float(lhs / rhs),
        InfixOp::Lt => Value::Boolean(lhs < rhs),
        InfixOp::Gt => Value::Boolean(lhs > rhs),
        InfixOp::LtEq => Value::Boolean(lhs <= rhs),
        InfixOp::GtEq => Value::Boolean(lhs >= rhs),
        InfixOp::Eq => Value::Boolean(lhs == rhs),
        InfixOp::NotEq => Value::Boolean(lhs != rhs),
        _ => make_error("unsupported infix operator on floats"),
    }
}

fn eval_string_infix(op: InfixOp, lhs: &str, rhs: &str) -> Value {
    match op {
        InfixOp::Add => Value::String(format!("{}{}", lhs, rhs)),
        InfixOp::Eq => Value::Boolean(lhs == rhs),
        InfixOp::NotEq => Value::Boolean(lhs != rhs),
        _ => make_error("unsupported infix operator on strings"),
    }
}
