use std::rc::Rc;

use tracing::{debug, info};

use crate::{
    ast::ExternalCommand,
    config::{Config, RuntimeConfig, SandboxConfig},
    error::RuntimeError,
    interpreter::{
        lowering::program::{Instruction, IntermediateProgram, Operand, UserFunction},
        runtime::{
            host::{Command, Event, Host, Reply, display_value, resolve_token},
            library::{install_core, install_module},
            registry::{Callable, FunctionRegistry, NativeCall},
            store::VariableStore,
        },
        sandbox::evaluate,
        value::core::Value,
    },
};

/// Result type for program execution.
pub type RunResult<T> = Result<T, RuntimeError>;

/// Executes intermediate programs against a variable store, a function
/// registry and a host.
///
/// One runtime is one program run: the store and the registry live as long
/// as it does and every call, callback and frame shares them.
///
/// # Example
/// ```
/// use solar::{
///     config::Config,
///     interpreter::{
///         lowering::program::lower,
///         parser::core::parse_program,
///         runtime::{core::Runtime, headless::HeadlessHost},
///         value::core::Value,
///     },
/// };
///
/// let parsed = parse_program("let x = 20\nlet y = (x + 1)\nprint y", false).unwrap();
/// let program = lower(&parsed.statements);
///
/// let mut runtime = Runtime::new(HeadlessHost::new(false), &Config::default());
/// runtime.run(&program).unwrap();
/// assert_eq!(runtime.store().get("y"), Some(&Value::Integer(21)));
/// assert_eq!(runtime.host().output(), ["21"]);
/// ```
pub struct Runtime<H: Host> {
    store:    VariableStore,
    registry: FunctionRegistry,
    host:     H,
    limits:   RuntimeConfig,
    sandbox:  SandboxConfig,
    depth:    usize,
}

impl<H: Host> Runtime<H> {
    /// Creates a runtime with the core functions installed.
    #[must_use]
    pub fn new(host: H, config: &Config) -> Self {
        let mut registry = FunctionRegistry::new();
        install_core(&mut registry);
        Self { store: VariableStore::new(),
               registry,
               host,
               limits: config.runtime.clone(),
               sandbox: config.sandbox.clone(),
               depth: 0 }
    }

    /// Runs a program from its first instruction to its last.
    ///
    /// # Errors
    /// The first [`RuntimeError`] raised; the run stops there.
    pub fn run(&mut self, program: &IntermediateProgram) -> RunResult<()> {
        info!(instructions = program.instructions.len(), "running program");
        self.exec_block(&program.instructions)?;
        info!("program finished");
        Ok(())
    }

    /// Calls a registered function by name.
    ///
    /// # Errors
    /// `UnknownFunction` if the name is not registered, plus anything the
    /// function raises.
    pub fn call(&mut self, name: &str, args: Vec<Value>, line: usize) -> RunResult<Value> {
        let Some(callable) = self.registry.get(name) else {
            return Err(RuntimeError::UnknownFunction { name: name.to_string(),
                                                       line });
        };
        debug!(function = name, args = args.len(), line, "call");
        match callable {
            Callable::Native(function) => {
                let mut call = NativeCall { args,
                                            line,
                                            host: &mut self.host };
                function(&mut call)
            },
            Callable::User(function) => self.call_user(&function, args, line),
        }
    }

    /// The variables.
    #[must_use]
    pub const fn store(&self) -> &VariableStore {
        &self.store
    }

    /// The function registry.
    #[must_use]
    pub const fn registry(&self) -> &FunctionRegistry {
        &self.registry
    }

    /// The host.
    #[must_use]
    pub const fn host(&self) -> &H {
        &self.host
    }

    /// The host, mutably, for scripting events between runs.
    pub const fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Consumes the runtime, returning the host.
    pub fn into_host(self) -> H {
        self.host
    }

    fn call_user(&mut self, function: &Rc<UserFunction>, args: Vec<Value>, line: usize) -> RunResult<Value> {
        if args.len() != function.params.len() {
            return Err(RuntimeError::ArgumentCountMismatch { name: function.name.clone(),
                                                             expected: function.params.len(),
                                                             found: args.len(),
                                                             line });
        }
        if self.depth >= self.limits.max_call_depth {
            return Err(RuntimeError::CallDepthExceeded { limit: self.limits.max_call_depth,
                                                         line });
        }

        self.store.push_frame(function.params.iter().cloned().zip(args).collect());
        self.depth += 1;
        let result = self.exec_block(&function.body);
        self.depth -= 1;
        self.store.pop_frame();

        result.map(|()| Value::None)
    }

    fn exec_block(&mut self, block: &[Instruction]) -> RunResult<()> {
        block.iter().try_for_each(|instruction| self.exec(instruction))
    }

    fn exec(&mut self, instruction: &Instruction) -> RunResult<()> {
        match instruction {
            Instruction::Store { name, value, line } => {
                let value = self.resolve(value, *line)?;
                self.store.set(name.as_str(), value);
            },
            Instruction::Print { value, line } => {
                let value = self.resolve(value, *line)?;
                let text = display_value(&self.host, &value);
                self.host.emit(&text);
            },
            Instruction::Invoke { target, args, line } => {
                let args = args.iter()
                               .map(|arg| self.resolve(arg, *line))
                               .collect::<RunResult<Vec<_>>>()?;
                self.call(target, args, *line)?;
            },
            Instruction::Guard { condition,
                                 block,
                                 line, } => {
                if self.resolve(condition, *line)?.is_truthy() {
                    self.exec_block(block)?;
                }
            },
            Instruction::Install { function, line } => {
                debug!(function = %function.name, line, "install");
                self.registry.install(Rc::clone(function));
            },
            Instruction::Import { module, line } => {
                if !install_module(&mut self.registry, module) {
                    return Err(RuntimeError::UnknownModule { name: module.clone(),
                                                             line: *line, });
                }
            },
            Instruction::Dispatch { command } => self.dispatch(command)?,
            Instruction::Verbatim { text, .. } => self.host.verbatim(text),
            Instruction::Loop { handle, body, line } => self.run_frames(handle, body, *line)?,
        }
        Ok(())
    }

    /// Produces an operand's value.
    fn resolve(&self, operand: &Operand, line: usize) -> RunResult<Value> {
        match operand {
            Operand::Const(value) => Ok(value.clone()),
            Operand::Load(name) => self.store
                                       .get(name)
                                       .cloned()
                                       .ok_or_else(|| RuntimeError::UnknownVariable { name: name.clone(),
                                                                                      line }),
            Operand::Eval(source) => {
                evaluate(source, &self.store, &self.sandbox).map_err(|e| RuntimeError::from_eval(e, line))
            },
        }
    }

    fn dispatch(&mut self, command: &ExternalCommand) -> RunResult<()> {
        let line = command.line;
        debug!(category = %command.category, sub_command = %command.sub_command, line, "dispatch");
        let reply = self.host
                        .dispatch(&Command::new(command, &self.store))
                        .map_err(|e| RuntimeError::Host { details: e.to_string(),
                                                          line })?;
        match reply {
            Reply::Done => {},
            Reply::Store { name, value } => self.store.set(name, value),
            Reply::EventLoop { handle } => self.pump_events(&handle, line)?,
        }
        Ok(())
    }

    /// Runs callbacks until the host ends the event loop of `handle`.
    fn pump_events(&mut self, handle: &str, line: usize) -> RunResult<()> {
        info!(handle, "event loop started");
        while let Some(Event::Invoke { function, args }) = self.host.poll(handle) {
            let args = args.iter().map(|token| resolve_token(token, &self.store)).collect();
            self.call(&function, args, line)?;
        }
        info!(handle, "event loop ended");
        Ok(())
    }

    /// Runs `body` once per frame while the host keeps `handle` going.
    fn run_frames(&mut self, handle: &str, body: &[Instruction], line: usize) -> RunResult<()> {
        let mut frames = 0usize;
        while self.host.frame(handle) {
            if frames == self.limits.max_frames {
                return Err(RuntimeError::LoopLimit { handle: handle.to_string(),
                                                     limit: self.limits.max_frames,
                                                     line });
            }
            self.exec_block(body)?;
            frames += 1;
        }
        debug!(handle, frames, "loop ended");
        Ok(())
    }
}
