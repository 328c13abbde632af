//! Statement execution and expression evaluation.

use crate::environment::{AssignResult, Scope};
use crate::exception::{Exception, ScriptResult};
use crate::interpreter::Interpreter;
use crate::object::{FunctionKind, JsObject, Property, PropertyAttributes, PropertySlot};
use crate::value::Value;
use parser::ast::{
    Expression, ForInit, FunctionBody, FunctionNode, Literal, MemberProperty, PropertyKey,
    PropertyKind, Statement, UnaryOperator, UpdateOperator, VariableDeclarator, VariableKind,
    LogicalOperator,
};
use std::rc::Rc;

/// How a statement finished
pub(crate) enum Completion {
    /// Fell through, with the value of the last expression statement
    Normal(Option<Value>),
    /// `return`
    Return(Value),
    /// `break`
    Break,
    /// `continue`
    Continue,
}

/// An assignable location
enum Reference {
    Binding(String),
    Property(Value, String),
}

impl Interpreter {
    // ----- programs and functions -----

    pub(crate) fn execute_program(&mut self, body: &[Statement], scope: &Scope) -> ScriptResult<Value> {
        self.hoist_declarations(body, scope, true)?;
        let mut last = Value::Undefined;
        for statement in body {
            if let Completion::Normal(Some(value)) = self.execute_statement(statement, scope)? {
                last = value;
            }
        }
        Ok(last)
    }

    pub(crate) fn call_script(
        &mut self,
        function: &JsObject,
        node: &Rc<FunctionNode>,
        closure: &Scope,
        this: &Value,
        args: &[Value],
    ) -> ScriptResult<Value> {
        let scope = if node.is_arrow {
            closure.function(None)
        } else {
            // Sloppy mode: a missing receiver is the global object.
            let this = if this.is_nullish() {
                Value::Object(self.global())
            } else {
                this.clone()
            };
            closure.function(Some(this))
        };

        if !node.is_arrow {
            if let Some(name) = &node.name {
                scope.declare(name, Value::Object(function.clone()), true);
            }
            let arguments = self.create_array(args.to_vec());
            scope.declare("arguments", Value::Object(arguments), true);
        }

        for (index, param) in node.params.iter().enumerate() {
            let value = if param.rest {
                let rest = args.get(index..).map(<[Value]>::to_vec).unwrap_or_default();
                Value::Object(self.create_array(rest))
            } else {
                args.get(index).cloned().unwrap_or_default()
            };
            let value = match (&param.default, value.is_undefined()) {
                (Some(default), true) => self.eval_expression(default, &scope)?,
                _ => value,
            };
            scope.declare(&param.name, value, true);
        }

        match &node.body {
            FunctionBody::Expression(expression) => self.eval_expression(expression, &scope),
            FunctionBody::Block(body) => {
                self.hoist_declarations(body, &scope, false)?;
                for statement in body {
                    if let Completion::Return(value) = self.execute_statement(statement, &scope)? {
                        return Ok(value);
                    }
                }
                Ok(Value::Undefined)
            }
        }
    }

    pub(crate) fn create_script_function(&mut self, node: &Rc<FunctionNode>, scope: &Scope) -> JsObject {
        let name = node.name.clone().unwrap_or_default();
        let length = node
            .params
            .iter()
            .take_while(|p| p.default.is_none() && !p.rest)
            .count();
        let kind = FunctionKind::Script {
            node: node.clone(),
            scope: scope.clone(),
            source_url: self.source_url.clone(),
        };
        let function = self.allocate_function(kind, &name, length);
        if !node.is_arrow {
            let prototype = self.create_object();
            prototype.define_value(
                "constructor",
                Value::Object(function.clone()),
                PropertyAttributes::DONT_ENUM,
            );
            function.define_value(
                "prototype",
                Value::Object(prototype),
                PropertyAttributes::DONT_ENUM | PropertyAttributes::DONT_DELETE,
            );
        }
        function
    }

    /// Binds `var` names and function declarations before a body runs.
    fn hoist_declarations(&mut self, body: &[Statement], scope: &Scope, global: bool) -> ScriptResult<()> {
        let mut names = Vec::new();
        collect_var_names(body, &mut names);
        let global_object = self.global();
        for name in names {
            if global {
                if !global_object.has_own_property(&name) {
                    global_object.define_value(&name, Value::Undefined, PropertyAttributes::DONT_DELETE);
                }
            } else if !scope.has_own(&name) {
                scope.declare(&name, Value::Undefined, true);
            }
        }
        self.hoist_functions(body, scope, global)
    }

    fn hoist_functions(&mut self, body: &[Statement], scope: &Scope, global: bool) -> ScriptResult<()> {
        for statement in body {
            if let Statement::FunctionDeclaration { function, .. } = statement {
                let name = function.name.clone().unwrap_or_default();
                let value = Value::Object(self.create_script_function(function, scope));
                if global {
                    self.global()
                        .define_value(&name, value, PropertyAttributes::DONT_DELETE);
                } else {
                    scope.declare(&name, value, true);
                }
            }
        }
        Ok(())
    }

    // ----- statements -----

    pub(crate) fn execute_statement(&mut self, statement: &Statement, scope: &Scope) -> ScriptResult<Completion> {
        self.position = statement.position().clone();
        self.execute_statement_inner(statement, scope)
            .map_err(|e| self.annotate(e))
    }

    fn execute_block(&mut self, body: &[Statement], scope: &Scope) -> ScriptResult<Completion> {
        let block_scope = scope.child();
        self.hoist_functions(body, &block_scope, false)?;
        let mut last = None;
        for statement in body {
            match self.execute_statement(statement, &block_scope)? {
                Completion::Normal(Some(value)) => last = Some(value),
                Completion::Normal(None) => {}
                abrupt => return Ok(abrupt),
            }
        }
        Ok(Completion::Normal(last))
    }

    fn execute_statement_inner(&mut self, statement: &Statement, scope: &Scope) -> ScriptResult<Completion> {
        match statement {
            Statement::VariableDeclaration {
                kind, declarations, ..
            } => {
                self.declare_variables(*kind, declarations, scope)?;
                Ok(Completion::Normal(None))
            }
            Statement::FunctionDeclaration { .. } | Statement::EmptyStatement { .. } => {
                Ok(Completion::Normal(None))
            }
            Statement::ExpressionStatement { expression, .. } => {
                let value = self.eval_expression(expression, scope)?;
                Ok(Completion::Normal(Some(value)))
            }
            Statement::ReturnStatement { argument, .. } => {
                let value = match argument {
                    Some(expression) => self.eval_expression(expression, scope)?,
                    None => Value::Undefined,
                };
                Ok(Completion::Return(value))
            }
            Statement::IfStatement {
                test,
                consequent,
                alternate,
                ..
            } => {
                if self.eval_expression(test, scope)?.is_truthy() {
                    self.execute_statement(consequent, scope)
                } else if let Some(alternate) = alternate {
                    self.execute_statement(alternate, scope)
                } else {
                    Ok(Completion::Normal(None))
                }
            }
            Statement::WhileStatement { test, body, .. } => {
                loop {
                    self.check_interrupt()?;
                    if !self.eval_expression(test, scope)?.is_truthy() {
                        break;
                    }
                    match self.execute_statement(body, scope)? {
                        Completion::Break => break,
                        Completion::Return(value) => return Ok(Completion::Return(value)),
                        Completion::Continue | Completion::Normal(_) => {}
                    }
                }
                Ok(Completion::Normal(None))
            }
            Statement::DoWhileStatement { body, test, .. } => {
                loop {
                    self.check_interrupt()?;
                    match self.execute_statement(body, scope)? {
                        Completion::Break => break,
                        Completion::Return(value) => return Ok(Completion::Return(value)),
                        Completion::Continue | Completion::Normal(_) => {}
                    }
                    if !self.eval_expression(test, scope)?.is_truthy() {
                        break;
                    }
                }
                Ok(Completion::Normal(None))
            }
            Statement::ForStatement {
                init,
                test,
                update,
                body,
                ..
            } => self.execute_for(init.as_ref(), test.as_ref(), update.as_ref(), body, scope),
            Statement::ForOfStatement {
                kind,
                binding,
                iterable,
                body,
                ..
            } => {
                let iterable = self.eval_expression(iterable, scope)?;
                let items = self.iterate(&iterable)?;
                self.execute_for_each(*kind, binding, items, body, scope)
            }
            Statement::ForInStatement {
                kind,
                binding,
                object,
                body,
                ..
            } => {
                let object = self.eval_expression(object, scope)?;
                let keys = self.enumerate_keys(&object);
                self.execute_for_each(*kind, binding, keys, body, scope)
            }
            Statement::BlockStatement { body, .. } => self.execute_block(body, scope),
            Statement::BreakStatement { .. } => Ok(Completion::Break),
            Statement::ContinueStatement { .. } => Ok(Completion::Continue),
            Statement::ThrowStatement { argument, .. } => {
                let value = self.eval_expression(argument, scope)?;
                Err(Exception::Thrown(value))
            }
            Statement::TryStatement {
                block,
                handler,
                finalizer,
                ..
            } => {
                let result = match (self.execute_block(block, scope), handler) {
                    (Err(exception), Some(handler)) if exception.is_catchable() => {
                        let value = self.exception_to_value(exception).unwrap_or_default();
                        let catch_scope = scope.child();
                        if let Some(param) = &handler.param {
                            catch_scope.declare(param, value, true);
                        }
                        self.execute_block(&handler.body, &catch_scope)
                    }
                    (result, _) => result,
                };
                if let Some(finalizer) = finalizer {
                    match self.execute_block(finalizer, scope)? {
                        Completion::Normal(_) => {}
                        abrupt => return Ok(abrupt),
                    }
                }
                result
            }
        }
    }

    fn declare_variables(
        &mut self,
        kind: VariableKind,
        declarations: &[VariableDeclarator],
        scope: &Scope,
    ) -> ScriptResult<()> {
        for declarator in declarations {
            match kind {
                VariableKind::Var => {
                    if let Some(init) = &declarator.init {
                        let value = self.eval_expression(init, scope)?;
                        self.assign_identifier(&declarator.name, value, scope)?;
                    }
                }
                VariableKind::Let | VariableKind::Const => {
                    let value = match &declarator.init {
                        Some(init) => self.eval_expression(init, scope)?,
                        None => Value::Undefined,
                    };
                    scope.declare(&declarator.name, value, kind == VariableKind::Let);
                }
            }
        }
        Ok(())
    }

    fn execute_for(
        &mut self,
        init: Option<&ForInit>,
        test: Option<&Expression>,
        update: Option<&Expression>,
        body: &Statement,
        scope: &Scope,
    ) -> ScriptResult<Completion> {
        let loop_scope = scope.child();
        let mut per_iteration = false;
        match init {
            Some(ForInit::VariableDeclaration { kind, declarations }) => {
                self.declare_variables(*kind, declarations, &loop_scope)?;
                per_iteration = *kind != VariableKind::Var;
            }
            Some(ForInit::Expression(expression)) => {
                self.eval_expression(expression, &loop_scope)?;
            }
            None => {}
        }

        // Each iteration gets its own copy of `let` bindings so closures
        // capture the value of that iteration.
        let mut iteration_scope = if per_iteration {
            loop_scope.copy_for_iteration()
        } else {
            loop_scope
        };
        loop {
            self.check_interrupt()?;
            if let Some(test) = test {
                if !self.eval_expression(test, &iteration_scope)?.is_truthy() {
                    break;
                }
            }
            match self.execute_statement(body, &iteration_scope)? {
                Completion::Break => break,
                Completion::Return(value) => return Ok(Completion::Return(value)),
                Completion::Continue | Completion::Normal(_) => {}
            }
            if per_iteration {
                iteration_scope = iteration_scope.copy_for_iteration();
            }
            if let Some(update) = update {
                self.eval_expression(update, &iteration_scope)?;
            }
        }
        Ok(Completion::Normal(None))
    }

    fn execute_for_each(
        &mut self,
        kind: Option<VariableKind>,
        binding: &str,
        items: Vec<Value>,
        body: &Statement,
        scope: &Scope,
    ) -> ScriptResult<Completion> {
        for item in items {
            self.check_interrupt()?;
            let iteration_scope = scope.child();
            match kind {
                Some(VariableKind::Let) => iteration_scope.declare(binding, item, true),
                Some(VariableKind::Const) => iteration_scope.declare(binding, item, false),
                Some(VariableKind::Var) | None => self.assign_identifier(binding, item, scope)?,
            }
            match self.execute_statement(body, &iteration_scope)? {
                Completion::Break => break,
                Completion::Return(value) => return Ok(Completion::Return(value)),
                Completion::Continue | Completion::Normal(_) => {}
            }
        }
        Ok(Completion::Normal(None))
    }

    /// Values produced by `for...of`.
    pub fn iterate(&mut self, iterable: &Value) -> ScriptResult<Vec<Value>> {
        match iterable {
            Value::String(s) => Ok(s.chars().map(|c| Value::from(c.to_string())).collect()),
            Value::Object(object) => match object.array_elements() {
                Some(elements) => Ok(elements),
                None => Err(Exception::type_error(format!(
                    "{} is not iterable",
                    self.display_string(iterable)
                ))),
            },
            other => Err(Exception::type_error(format!(
                "{} is not iterable",
                self.display_string(other)
            ))),
        }
    }

    /// Keys visited by `for...in`: enumerable own keys, then inherited ones.
    fn enumerate_keys(&mut self, value: &Value) -> Vec<Value> {
        let mut keys: Vec<String> = Vec::new();
        match value {
            Value::String(s) => keys.extend((0..s.chars().count()).map(|i| i.to_string())),
            Value::Object(object) => {
                let mut current = Some(object.clone());
                while let Some(o) = current {
                    for key in o.enumerable_own_keys() {
                        if !keys.contains(&key) {
                            keys.push(key);
                        }
                    }
                    current = o.prototype();
                }
            }
            _ => {}
        }
        keys.into_iter().map(Value::from).collect()
    }

    // ----- identifiers -----

    fn lookup_identifier(&mut self, name: &str, scope: &Scope) -> ScriptResult<Value> {
        if let Some(value) = scope.lookup(name) {
            return Ok(value);
        }
        let global = self.global();
        if global.has_property(name) {
            return self.get_property(&Value::Object(global), name);
        }
        Err(Exception::reference_error(format!("{} is not defined", name)))
    }

    fn assign_identifier(&mut self, name: &str, value: Value, scope: &Scope) -> ScriptResult<()> {
        match scope.assign(name, value.clone()) {
            AssignResult::Assigned => Ok(()),
            AssignResult::Constant => Err(Exception::type_error("Assignment to constant variable.")),
            // Sloppy mode: assigning an undeclared name creates a global property.
            AssignResult::Unresolved => {
                let global = Value::Object(self.global());
                self.set_property(&global, name, value)
            }
        }
    }

    fn is_resolvable(&self, name: &str, scope: &Scope) -> bool {
        scope.lookup(name).is_some() || self.global().has_property(name)
    }

    // ----- expressions -----

    pub(crate) fn eval_expression(&mut self, expression: &Expression, scope: &Scope) -> ScriptResult<Value> {
        match expression {
            Expression::Identifier { name, .. } => self.lookup_identifier(name, scope),
            Expression::Literal { value, .. } => Ok(match value {
                Literal::Number(n) => Value::Number(*n),
                Literal::String(s) => Value::string(s),
                Literal::Boolean(b) => Value::Boolean(*b),
                Literal::Null => Value::Null,
            }),
            Expression::TemplateLiteral {
                quasis, expressions, ..
            } => {
                let mut out = String::new();
                for (index, text) in quasis.iter().enumerate() {
                    out.push_str(text);
                    if let Some(expression) = expressions.get(index) {
                        let value = self.eval_expression(expression, scope)?;
                        out.push_str(&self.to_js_string(&value)?);
                    }
                }
                Ok(Value::from(out))
            }
            Expression::ThisExpression { .. } => Ok(scope.this_value()),
            Expression::ArrayExpression { elements, .. } => {
                let mut values = Vec::with_capacity(elements.len());
                for element in elements {
                    values.push(match element {
                        Some(expression) => self.eval_expression(expression, scope)?,
                        None => Value::Undefined,
                    });
                }
                Ok(Value::Object(self.create_array(values)))
            }
            Expression::ObjectExpression { properties, .. } => {
                let object = self.create_object();
                for property in properties {
                    let key = match &property.key {
                        PropertyKey::Static(key) => key.clone(),
                        PropertyKey::Computed(expression) => {
                            let value = self.eval_expression(expression, scope)?;
                            self.to_property_key(&value)?
                        }
                    };
                    let value = self.eval_expression(&property.value, scope)?;
                    match property.kind {
                        PropertyKind::Init => object.set_value(&key, value),
                        PropertyKind::Get | PropertyKind::Set => {
                            let function = value.as_object().cloned();
                            let (mut get, mut set) = match object.get_own_property(&key).map(|p| p.slot) {
                                Some(PropertySlot::Accessor { get, set }) => (get, set),
                                _ => (None, None),
                            };
                            if property.kind == PropertyKind::Get {
                                get = function;
                            } else {
                                set = function;
                            }
                            object.define_property(&key, Property::accessor(get, set, PropertyAttributes::empty()));
                        }
                    }
                }
                Ok(Value::Object(object))
            }
            Expression::FunctionExpression { function, .. } => {
                Ok(Value::Object(self.create_script_function(function, scope)))
            }
            Expression::UnaryExpression {
                operator, argument, ..
            } => self.eval_unary(*operator, argument, scope),
            Expression::UpdateExpression {
                operator,
                prefix,
                argument,
                ..
            } => {
                let reference = self.eval_reference(argument, scope)?;
                let old = self.get_reference(&reference, scope)?;
                let old = self.to_number(&old)?;
                let new = match operator {
                    UpdateOperator::Increment => old + 1.0,
                    UpdateOperator::Decrement => old - 1.0,
                };
                self.put_reference(&reference, Value::Number(new), scope)?;
                Ok(Value::Number(if *prefix { new } else { old }))
            }
            Expression::BinaryExpression {
                operator,
                left,
                right,
                ..
            } => {
                let left = self.eval_expression(left, scope)?;
                let right = self.eval_expression(right, scope)?;
                self.binary_operation(*operator, &left, &right)
            }
            Expression::LogicalExpression {
                operator,
                left,
                right,
                ..
            } => {
                let left = self.eval_expression(left, scope)?;
                let short_circuit = match operator {
                    LogicalOperator::And => !left.is_truthy(),
                    LogicalOperator::Or => left.is_truthy(),
                    LogicalOperator::NullishCoalescing => !left.is_nullish(),
                };
                if short_circuit {
                    Ok(left)
                } else {
                    self.eval_expression(right, scope)
                }
            }
            Expression::AssignmentExpression {
                operator,
                left,
                right,
                ..
            } => {
                let reference = self.eval_reference(left, scope)?;
                let value = match operator.binary_operator() {
                    None => self.eval_expression(right, scope)?,
                    Some(op) => {
                        let current = self.get_reference(&reference, scope)?;
                        let rhs = self.eval_expression(right, scope)?;
                        self.binary_operation(op, &current, &rhs)?
                    }
                };
                self.put_reference(&reference, value.clone(), scope)?;
                Ok(value)
            }
            Expression::ConditionalExpression {
                test,
                consequent,
                alternate,
                ..
            } => {
                if self.eval_expression(test, scope)?.is_truthy() {
                    self.eval_expression(consequent, scope)
                } else {
                    self.eval_expression(alternate, scope)
                }
            }
            Expression::MemberExpression {
                object, property, ..
            } => {
                let base = self.eval_expression(object, scope)?;
                let key = self.member_key(property, scope)?;
                self.get_property(&base, &key)
            }
            Expression::CallExpression {
                callee,
                arguments,
                position,
            } => {
                let (function, this) = match &**callee {
                    Expression::MemberExpression {
                        object, property, ..
                    } => {
                        let base = self.eval_expression(object, scope)?;
                        let key = self.member_key(property, scope)?;
                        let function = self.get_property(&base, &key)?;
                        (function, base)
                    }
                    other => (self.eval_expression(other, scope)?, Value::Undefined),
                };
                let args = self.eval_arguments(arguments, scope)?;
                self.position = position.clone();
                if !function.is_callable() {
                    return Err(Exception::type_error(format!(
                        "{} is not a function",
                        describe_callee(callee)
                    )));
                }
                self.call(&function, &this, &args)
            }
            Expression::NewExpression {
                callee,
                arguments,
                position,
            } => {
                let constructor = self.eval_expression(callee, scope)?;
                let args = self.eval_arguments(arguments, scope)?;
                self.position = position.clone();
                let is_constructor = matches!(&constructor, Value::Object(o) if o.is_constructor());
                if !is_constructor {
                    return Err(Exception::type_error(format!(
                        "{} is not a constructor",
                        describe_callee(callee)
                    )));
                }
                self.construct(&constructor, &args)
            }
            Expression::SequenceExpression { expressions, .. } => {
                let mut last = Value::Undefined;
                for expression in expressions {
                    last = self.eval_expression(expression, scope)?;
                }
                Ok(last)
            }
        }
    }

    fn eval_arguments(&mut self, arguments: &[Expression], scope: &Scope) -> ScriptResult<Vec<Value>> {
        let mut values = Vec::with_capacity(arguments.len());
        for argument in arguments {
            values.push(self.eval_expression(argument, scope)?);
        }
        Ok(values)
    }

    fn member_key(&mut self, property: &MemberProperty, scope: &Scope) -> ScriptResult<String> {
        match property {
            MemberProperty::Named(name) => Ok(name.clone()),
            MemberProperty::Computed(expression) => {
                let value = self.eval_expression(expression, scope)?;
                self.to_property_key(&value)
            }
        }
    }

    fn eval_unary(&mut self, operator: UnaryOperator, argument: &Expression, scope: &Scope) -> ScriptResult<Value> {
        match operator {
            UnaryOperator::Typeof => {
                if let Expression::Identifier { name, .. } = argument {
                    if !self.is_resolvable(name, scope) {
                        return Ok(Value::from("undefined"));
                    }
                }
                let value = self.eval_expression(argument, scope)?;
                Ok(Value::from(value.type_of()))
            }
            UnaryOperator::Delete => match argument {
                Expression::MemberExpression {
                    object, property, ..
                } => {
                    let base = self.eval_expression(object, scope)?;
                    let key = self.member_key(property, scope)?;
                    match base {
                        Value::Object(object) => Ok(Value::Boolean(object.delete(&key))),
                        Value::Undefined | Value::Null => Err(Exception::type_error(format!(
                            "Cannot convert undefined or null to object (deleting '{}')",
                            key
                        ))),
                        _ => Ok(Value::Boolean(true)),
                    }
                }
                Expression::Identifier { .. } => Ok(Value::Boolean(false)),
                other => {
                    self.eval_expression(other, scope)?;
                    Ok(Value::Boolean(true))
                }
            },
            UnaryOperator::Void => {
                self.eval_expression(argument, scope)?;
                Ok(Value::Undefined)
            }
            UnaryOperator::Not => Ok(Value::Boolean(!self.eval_expression(argument, scope)?.is_truthy())),
            UnaryOperator::Minus => {
                let value = self.eval_expression(argument, scope)?;
                Ok(Value::Number(-self.to_number(&value)?))
            }
            UnaryOperator::Plus => {
                let value = self.eval_expression(argument, scope)?;
                Ok(Value::Number(self.to_number(&value)?))
            }
        }
    }

    fn eval_reference(&mut self, expression: &Expression, scope: &Scope) -> ScriptResult<Reference> {
        match expression {
            Expression::Identifier { name, .. } => Ok(Reference::Binding(name.clone())),
            Expression::MemberExpression {
                object, property, ..
            } => {
                let base = self.eval_expression(object, scope)?;
                let key = self.member_key(property, scope)?;
                Ok(Reference::Property(base, key))
            }
            _ => Err(Exception::Error(core_types::JsError::syntax_error(
                "Invalid assignment target",
                Some(expression.position().clone()),
            ))),
        }
    }

    fn get_reference(&mut self, reference: &Reference, scope: &Scope) -> ScriptResult<Value> {
        match reference {
            Reference::Binding(name) => self.lookup_identifier(name, scope),
            Reference::Property(base, key) => self.get_property(base, key),
        }
    }

    fn put_reference(&mut self, reference: &Reference, value: Value, scope: &Scope) -> ScriptResult<()> {
        match reference {
            Reference::Binding(name) => self.assign_identifier(name, value, scope),
            Reference::Property(base, key) => self.set_property(base, key, value),
        }
    }
}

/// Source-like rendering of a callee for "is not a function" messages.
fn describe_callee(expression: &Expression) -> String {
    match expression {
        Expression::Identifier { name, .. } => name.clone(),
        Expression::ThisExpression { .. } => "this".to_string(),
        Expression::MemberExpression {
            object, property, ..
        } => match property {
            MemberProperty::Named(name) => format!("{}.{}", describe_callee(object), name),
            MemberProperty::Computed(_) => format!("{}[...]", describe_callee(object)),
        },
        Expression::CallExpression { callee, .. } => format!("{}(...)", describe_callee(callee)),
        _ => "expression".to_string(),
    }
}

/// Collects `var` names declared anywhere in `body` outside nested functions.
fn collect_var_names(body: &[Statement], names: &mut Vec<String>) {
    for statement in body {
        collect_statement_var_names(statement, names);
    }
}

fn collect_statement_var_names(statement: &Statement, names: &mut Vec<String>) {
    let push = |name: &str, names: &mut Vec<String>| {
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    };
    match statement {
        Statement::VariableDeclaration {
            kind: VariableKind::Var,
            declarations,
            ..
        } => {
            for declarator in declarations {
                push(&declarator.name, names);
            }
        }
        Statement::IfStatement {
            consequent,
            alternate,
            ..
        } => {
            collect_statement_var_names(consequent, names);
            if let Some(alternate) = alternate {
                collect_statement_var_names(alternate, names);
            }
        }
        Statement::WhileStatement { body, .. } | Statement::DoWhileStatement { body, .. } => {
            collect_statement_var_names(body, names)
        }
        Statement::ForStatement { init, body, .. } => {
            if let Some(ForInit::VariableDeclaration {
                kind: VariableKind::Var,
                declarations,
            }) = init
            {
                for declarator in declarations {
                    push(&declarator.name, names);
                }
            }
            collect_statement_var_names(body, names);
        }
        Statement::ForInStatement {
            kind, binding, body, ..
        }
        | Statement::ForOfStatement {
            kind, binding, body, ..
        } => {
            if *kind == Some(VariableKind::Var) {
                push(binding, names);
            }
            collect_statement_var_names(body, names);
        }
        Statement::BlockStatement { body, .. } => collect_var_names(body, names),
        Statement::TryStatement {
            block,
            handler,
            finalizer,
            ..
        } => {
            collect_var_names(block, names);
            if let Some(handler) = handler {
                collect_var_names(&handler.body, names);
            }
            if let Some(finalizer) = finalizer {
                collect_var_names(finalizer, names);
            }
        }
        _ => {}
    }
}
