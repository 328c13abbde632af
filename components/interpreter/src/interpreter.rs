//! The interpreter: owns the heap, the realm, the global scope and the event loop.

use crate::environment::Scope;
use crate::exception::{Exception, ScriptResult};
use crate::heap::{Heap, HeapStats};
use crate::object::{FunctionKind, JsObject, ObjectData, ObjectKind, PropertyAttributes};
use crate::realm::{Intrinsics, ERROR_KINDS};
use crate::value::Value;
use async_runtime::{EventLoop, EventLoopConfig, LoopHandle, RunOutcome, Turn};
use core_types::{ErrorKind, JsError, SourcePosition, StackFrame};
use parser::Parser;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Frames recorded in error stacks.
const MAX_STACK_FRAMES: usize = 10;

/// Interpreter configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterpreterConfig {
    /// Maximum nesting of function calls before a `RangeError`
    pub max_call_depth: usize,
    /// Event loop settings
    pub event_loop: EventLoopConfig,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            max_call_depth: 256,
            event_loop: EventLoopConfig::default(),
        }
    }
}

/// Task type run by the interpreter's event loop.
pub type ScriptTask = async_runtime::Task<Interpreter, Exception>;

struct Frame {
    name: Option<String>,
    return_position: SourcePosition,
    return_url: Rc<str>,
}

/// A tree-walking script interpreter.
///
/// An interpreter is single-threaded: every value it hands out is tied to it
/// and to the thread it runs on.
///
/// # Examples
///
/// ```
/// use interpreter::{Interpreter, Value};
///
/// let mut interp = Interpreter::new();
/// let result = interp.evaluate("var x = 20; x + 1").unwrap();
/// assert_eq!(result, Value::from(21));
/// ```
pub struct Interpreter {
    config: InterpreterConfig,
    heap: Heap,
    intrinsics: Intrinsics,
    global_scope: Scope,
    event_loop: EventLoop<Interpreter, Exception>,
    interrupt: Arc<AtomicBool>,
    frames: Vec<Frame>,
    depth: usize,
    pub(crate) position: SourcePosition,
    pub(crate) source_url: Rc<str>,
    torn_down: bool,
}

impl Interpreter {
    /// Creates an interpreter with the default configuration.
    pub fn new() -> Self {
        Self::with_config(InterpreterConfig::default())
    }

    /// Creates an interpreter.
    pub fn with_config(config: InterpreterConfig) -> Self {
        let mut heap = Heap::new();
        let intrinsics = Intrinsics::new(&mut heap);
        let global_scope = Scope::root(Value::Object(intrinsics.global.clone()));
        let event_loop = EventLoop::with_config(config.event_loop.clone());
        let interrupt = event_loop.handle().interrupt_flag();
        Self {
            config,
            heap,
            intrinsics,
            global_scope,
            event_loop,
            interrupt,
            frames: Vec::new(),
            depth: 0,
            position: SourcePosition::default(),
            source_url: Rc::from("<eval>"),
            torn_down: false,
        }
    }

    /// The configuration in use.
    pub fn config(&self) -> &InterpreterConfig {
        &self.config
    }

    /// The global object.
    pub fn global(&self) -> JsObject {
        self.intrinsics.global.clone()
    }

    /// Intrinsic prototypes.
    pub fn intrinsics(&self) -> &Intrinsics {
        &self.intrinsics
    }

    /// Heap statistics.
    pub fn heap_stats(&self) -> HeapStats {
        self.heap.stats()
    }

    /// The event loop that runs this interpreter's asynchronous callbacks.
    pub fn event_loop_mut(&mut self) -> &mut EventLoop<Interpreter, Exception> {
        &mut self.event_loop
    }

    /// A thread-safe handle that interrupts running script and the event loop.
    pub fn loop_handle(&self) -> LoopHandle {
        self.event_loop.handle()
    }

    /// Returns true once [`Interpreter::teardown`] has run.
    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Evaluates a script and returns its completion value.
    ///
    /// Uncaught exceptions are converted to [`JsError`].
    pub fn evaluate(&mut self, source: &str) -> Result<Value, JsError> {
        match self.run_script(source, "<eval>") {
            Ok(value) => Ok(value),
            Err(exception) => Err(self.exception_to_error(exception)),
        }
    }

    /// Evaluates a script named `url`, keeping the raw [`Exception`] on failure.
    pub fn run_script(&mut self, source: &str, url: &str) -> ScriptResult<Value> {
        if self.torn_down {
            return Err(Exception::Error(JsError::internal(
                "context has been disposed",
            )));
        }
        let program = Parser::new(source).parse().map_err(Exception::from)?;
        let saved_url = std::mem::replace(&mut self.source_url, Rc::from(url));
        let scope = self.global_scope.clone();
        let result = self.execute_program(&program.body, &scope);
        self.source_url = saved_url;
        result
    }

    /// Runs queued tasks, timers and I/O completions until none remain.
    ///
    /// An exception escaping a callback stops the loop and is returned;
    /// the remaining work stays queued.
    pub fn run_event_loop(&mut self) -> ScriptResult<RunOutcome> {
        loop {
            match self.event_loop.next_task() {
                Turn::Task(task) => task.run(self)?,
                Turn::Idle => return Ok(RunOutcome::Idle),
                Turn::Interrupted => return Ok(RunOutcome::Interrupted),
            }
        }
    }

    /// Fails with [`Exception::Terminated`] once the loop handle was interrupted.
    pub fn check_interrupt(&self) -> ScriptResult<()> {
        if self.interrupt.load(Ordering::Relaxed) {
            Err(Exception::Terminated)
        } else {
            Ok(())
        }
    }

    // ----- object creation -----

    /// Allocates an ordinary object inheriting from `Object.prototype`.
    pub fn create_object(&mut self) -> JsObject {
        let prototype = self.intrinsics.object_prototype.clone();
        self.create_object_with_prototype(Some(prototype))
    }

    /// Allocates an ordinary object with an explicit prototype.
    pub fn create_object_with_prototype(&mut self, prototype: Option<JsObject>) -> JsObject {
        self.heap
            .allocate(ObjectData::new(ObjectKind::Ordinary, prototype))
    }

    /// Allocates an array.
    pub fn create_array(&mut self, elements: Vec<Value>) -> JsObject {
        let prototype = self.intrinsics.array_prototype.clone();
        self.heap
            .allocate(ObjectData::new(ObjectKind::Array(elements), Some(prototype)))
    }

    pub(crate) fn allocate_function(&mut self, kind: FunctionKind, name: &str, length: usize) -> JsObject {
        let prototype = self.intrinsics.function_prototype.clone();
        let function = self
            .heap
            .allocate(ObjectData::new(ObjectKind::Function(kind), Some(prototype)));
        let hidden = PropertyAttributes::DONT_ENUM | PropertyAttributes::READ_ONLY;
        function.define_value("name", Value::from(name), hidden);
        function.define_value("length", Value::from(length), hidden);
        function
    }

    /// Wraps a Rust closure as a script function.
    pub fn create_function<F>(&mut self, name: &str, length: usize, function: F) -> JsObject
    where
        F: Fn(&mut Interpreter, &Value, &[Value]) -> ScriptResult<Value> + 'static,
    {
        self.allocate_function(
            FunctionKind::Native {
                function: Rc::new(function),
                constructor: false,
            },
            name,
            length,
        )
    }

    /// Wraps a Rust closure as a constructor whose instances inherit from `prototype`.
    ///
    /// Under `new`, the closure receives the freshly allocated instance as
    /// `this`; returning an object replaces it.
    pub fn create_constructor<F>(
        &mut self,
        name: &str,
        length: usize,
        prototype: JsObject,
        function: F,
    ) -> JsObject
    where
        F: Fn(&mut Interpreter, &Value, &[Value]) -> ScriptResult<Value> + 'static,
    {
        let constructor = self.allocate_function(
            FunctionKind::Native {
                function: Rc::new(function),
                constructor: true,
            },
            name,
            length,
        );
        constructor.define_value(
            "prototype",
            Value::Object(prototype.clone()),
            PropertyAttributes::DONT_ENUM | PropertyAttributes::DONT_DELETE,
        );
        prototype.define_value(
            "constructor",
            Value::Object(constructor.clone()),
            PropertyAttributes::DONT_ENUM,
        );
        constructor
    }

    /// Creates the result of `target.bind(this, ...arguments)`.
    pub fn create_bound_function(&mut self, target: JsObject, this: Value, arguments: Vec<Value>) -> JsObject {
        let name = match self.read_data(&target, "name") {
            Value::String(name) => format!("bound {}", name),
            _ => "bound ".to_string(),
        };
        let length = match self.read_data(&target, "length") {
            Value::Number(n) => (n as usize).saturating_sub(arguments.len()),
            _ => 0,
        };
        self.allocate_function(
            FunctionKind::Bound {
                target,
                this,
                arguments,
            },
            &name,
            length,
        )
    }

    /// Defines a non-enumerable method on `target`.
    pub fn define_method<F>(&mut self, target: &JsObject, name: &str, length: usize, function: F)
    where
        F: Fn(&mut Interpreter, &Value, &[Value]) -> ScriptResult<Value> + 'static,
    {
        let method = self.create_function(name, length, function);
        target.define_value(name, Value::Object(method), PropertyAttributes::DONT_ENUM);
    }

    /// Creates an error object with a stack captured at the current position.
    pub fn create_error(&mut self, kind: ErrorKind, message: &str) -> JsObject {
        let frames = self.capture_stack();
        self.create_error_with_frames(kind, message, frames)
    }

    fn create_error_with_frames(
        &mut self,
        kind: ErrorKind,
        message: &str,
        frames: Vec<StackFrame>,
    ) -> JsObject {
        let prototype = self.intrinsics.error_prototype(kind);
        let stack = JsError::new(kind, message)
            .with_stack(frames.clone())
            .stack_trace();
        let error = self
            .heap
            .allocate(ObjectData::new(ObjectKind::Error(frames), Some(prototype)));
        let hidden = PropertyAttributes::DONT_ENUM;
        if !ERROR_KINDS.contains(&kind) {
            error.define_value("name", Value::from(kind.name()), hidden);
        }
        error.define_value("message", Value::from(message), hidden);
        error.define_value("stack", Value::from(stack), hidden);
        error
    }

    /// Converts a native error into the value a `catch` block sees.
    pub fn error_to_value(&mut self, error: JsError) -> Value {
        let frames = if error.stack.is_empty() {
            self.capture_stack()
        } else {
            error.stack.clone()
        };
        Value::Object(self.create_error_with_frames(error.kind, &error.message, frames))
    }

    /// The value a `catch` block binds, or `None` for uncatchable exceptions.
    pub fn exception_to_value(&mut self, exception: Exception) -> Option<Value> {
        match exception {
            Exception::Thrown(value) => Some(value),
            Exception::Error(error) if !error.is_termination() => Some(self.error_to_value(error)),
            _ => None,
        }
    }

    /// Describes an exception for native callers.
    pub fn exception_to_error(&mut self, exception: Exception) -> JsError {
        match exception {
            Exception::Error(error) => error,
            Exception::Exit(code) => JsError::new(
                ErrorKind::Termination,
                format!("process exited with code {}", code),
            ),
            Exception::Terminated => JsError::termination(),
            Exception::Thrown(value) => self.thrown_value_to_error(&value),
        }
    }

    fn thrown_value_to_error(&mut self, value: &Value) -> JsError {
        if let Value::Object(object) = value {
            if let Some(frames) = object.error_frames() {
                let name = self.display_string(&self.read_data(object, "name"));
                let message = self.display_string(&self.read_data(object, "message"));
                let position = frames
                    .first()
                    .map(|f| SourcePosition::new(f.line, f.column, 0));
                return JsError::new(ErrorKind::from_name(&name), message)
                    .with_stack(frames)
                    .with_position(position);
            }
        }
        JsError::error(format!("Uncaught {}", self.display_string(value)))
    }

    /// Reads a data property along the prototype chain without running getters.
    pub fn read_data(&self, object: &JsObject, key: &str) -> Value {
        match object.find_property(key).map(|p| p.slot) {
            Some(crate::object::PropertySlot::Data(value)) => value,
            _ => Value::Undefined,
        }
    }

    /// String form for diagnostics; never runs script and never fails.
    pub fn display_string(&self, value: &Value) -> String {
        if let Some(s) = value.primitive_to_string() {
            return s.to_string();
        }
        match value {
            Value::Object(object) if object.is_error() => {
                let name = self
                    .read_data(object, "name")
                    .primitive_to_string()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "Error".to_string());
                let message = self
                    .read_data(object, "message")
                    .primitive_to_string()
                    .map(|s| s.to_string())
                    .unwrap_or_default();
                if message.is_empty() {
                    name
                } else {
                    format!("{}: {}", name, message)
                }
            }
            Value::Object(object) if object.is_callable() => "[Function]".to_string(),
            Value::Object(object) => match object.array_elements() {
                Some(elements) => elements
                    .iter()
                    .map(|e| match e {
                        Value::Undefined | Value::Null => String::new(),
                        other => self.display_string(other),
                    })
                    .collect::<Vec<_>>()
                    .join(","),
                None => "[object Object]".to_string(),
            },
            _ => String::new(),
        }
    }

    // ----- calls -----

    /// Calls `callee` with the given `this` and arguments.
    pub fn call(&mut self, callee: &Value, this: &Value, args: &[Value]) -> ScriptResult<Value> {
        match callee {
            Value::Object(object) if object.is_callable() => self.call_object(object, this, args),
            other => Err(Exception::type_error(format!(
                "{} is not a function",
                self.display_string(other)
            ))),
        }
    }

    /// Applies `new` to `callee`.
    pub fn construct(&mut self, callee: &Value, args: &[Value]) -> ScriptResult<Value> {
        let constructor = match callee {
            Value::Object(object) if object.is_constructor() => object.clone(),
            other => {
                return Err(Exception::type_error(format!(
                    "{} is not a constructor",
                    self.display_string(other)
                )))
            }
        };
        let kind = match &constructor.borrow().kind {
            ObjectKind::Function(kind) => kind.clone(),
            _ => return Err(Exception::type_error("not a constructor")),
        };
        if let FunctionKind::Bound {
            target, arguments, ..
        } = kind
        {
            let mut all = arguments;
            all.extend_from_slice(args);
            return self.construct(&Value::Object(target), &all);
        }

        let prototype = match self.read_data(&constructor, "prototype") {
            Value::Object(p) => p,
            _ => self.intrinsics.object_prototype.clone(),
        };
        let instance = self.create_object_with_prototype(Some(prototype));
        let this = Value::Object(instance);
        let result = self.call_object(&constructor, &this, args)?;
        Ok(match result {
            Value::Object(_) => result,
            _ => this,
        })
    }

    pub(crate) fn call_object(&mut self, function: &JsObject, this: &Value, args: &[Value]) -> ScriptResult<Value> {
        self.check_interrupt()?;
        if self.depth >= self.config.max_call_depth {
            return Err(Exception::range_error("Maximum call stack size exceeded"));
        }
        let kind = match &function.borrow().kind {
            ObjectKind::Function(kind) => kind.clone(),
            _ => return Err(Exception::type_error("object is not a function")),
        };

        self.depth += 1;
        let result = match kind {
            FunctionKind::Native { function, .. } => function(self, this, args),
            FunctionKind::Bound {
                target,
                this: bound_this,
                arguments,
            } => {
                let mut all = arguments;
                all.extend_from_slice(args);
                self.call_object(&target, &bound_this, &all)
            }
            FunctionKind::Script {
                node,
                scope,
                source_url,
            } => {
                let name = node.name.clone();
                let saved_url = std::mem::replace(&mut self.source_url, source_url);
                self.frames.push(Frame {
                    name,
                    return_position: self.position.clone(),
                    return_url: saved_url,
                });
                let result = self.call_script(function, &node, &scope, this, args);
                if let Some(frame) = self.frames.pop() {
                    self.position = frame.return_position;
                    self.source_url = frame.return_url;
                }
                result
            }
        };
        self.depth -= 1;
        result
    }

    /// Captures the current script call stack, innermost first.
    pub fn capture_stack(&self) -> Vec<StackFrame> {
        let mut stack = Vec::new();
        let mut position = self.position.clone();
        let mut url = self.source_url.clone();
        for frame in self.frames.iter().rev() {
            stack.push(StackFrame {
                function_name: frame.name.clone(),
                source_url: Some(url.to_string()),
                line: position.line,
                column: position.column,
            });
            position = frame.return_position.clone();
            url = frame.return_url.clone();
            if stack.len() >= MAX_STACK_FRAMES {
                return stack;
            }
        }
        stack.push(StackFrame {
            function_name: None,
            source_url: Some(url.to_string()),
            line: position.line,
            column: position.column,
        });
        stack
    }

    /// Attaches the current position and stack to native errors that lack them.
    pub(crate) fn annotate(&self, exception: Exception) -> Exception {
        match exception {
            Exception::Error(mut error) if error.stack.is_empty() => {
                error.source_position = error
                    .source_position
                    .take()
                    .or_else(|| Some(self.position.clone()));
                error.stack = self.capture_stack();
                Exception::Error(error)
            }
            other => other,
        }
    }

    /// Disposes the context: drops pending callbacks, clears the global
    /// scope and empties every object so cyclic garbage is reclaimed.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        self.event_loop.shutdown();
        self.global_scope.clear();
        let cleared = self.heap.teardown();
        log::debug!("interpreter teardown released {} objects", cleared);
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Interpreter {
    fn drop(&mut self) {
        self.teardown();
    }
}
