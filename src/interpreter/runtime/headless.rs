use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

use tracing::{debug, warn};

use crate::interpreter::{
    runtime::host::{Command, Event, Host, HostError, Reply, display_value},
    tokenizer::Token,
    value::core::{Handle, Value},
};

/// A window created with `ui window`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Window {
    /// The title, initially the window's name.
    pub title:  String,
    /// Width in pixels, zero until `ui size`.
    pub width:  f64,
    /// Height in pixels, zero until `ui size`.
    pub height: f64,
    /// Background colour.
    pub bg:     Option<String>,
    /// Text colour of widgets created afterwards.
    pub fg:     Option<String>,
}

/// A function name and its raw argument tokens, called when something
/// happens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Callback {
    /// The registry name.
    pub function: String,
    /// Argument tokens, resolved when the callback runs.
    pub args:     Vec<Token>,
}

/// A widget placed in a window.
#[derive(Debug, Clone, PartialEq)]
pub struct Widget {
    /// `label`, `button`, `entry`, `checkbox` or `slider`.
    pub kind:     &'static str,
    /// The window it belongs to.
    pub window:   String,
    /// Its caption, empty for widgets without one.
    pub text:     String,
    /// Horizontal position.
    pub x:        f64,
    /// Vertical position.
    pub y:        f64,
    /// Text colour taken from the window when the widget was created.
    pub fg:       Option<String>,
    /// What a press runs.
    pub callback: Option<Callback>,
}

/// A drawing operation recorded on a canvas.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCall {
    /// Fill the whole canvas.
    Clear {
        /// Fill colour.
        color: String,
    },
    /// A filled rectangle.
    Rect {
        /// Fill colour.
        color:  String,
        /// Left edge.
        x:      f64,
        /// Top edge.
        y:      f64,
        /// Width.
        width:  f64,
        /// Height.
        height: f64,
    },
    /// A filled circle.
    Circle {
        /// Fill colour.
        color:  String,
        /// Centre, horizontal.
        x:      f64,
        /// Centre, vertical.
        y:      f64,
        /// Radius.
        radius: f64,
    },
    /// A line of text.
    Text {
        /// Text colour.
        color: String,
        /// The text drawn.
        text:  String,
        /// Left edge.
        x:     f64,
        /// Top edge.
        y:     f64,
    },
}

/// A drawing surface created with `gfx screen`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Canvas {
    /// Width in pixels.
    pub width:     f64,
    /// Height in pixels.
    pub height:    f64,
    /// Draw calls since the last `gfx clear`.
    pub draws:     Vec<DrawCall>,
    /// Number of `gfx present` calls.
    pub presented: usize,
}

#[derive(Debug, Clone)]
enum Action {
    Press { widget: String },
    Type { widget: String, text: String },
    Key { window: String, key: String },
}

/// A host without a display.
///
/// It keeps windows, widgets and canvases as plain data, answers read forms
/// from its own state, and replays a script of user actions when the program
/// enters an event loop. Program output is collected, and printed to stdout
/// too when echo is on.
///
/// # Example
/// ```
/// use solar::{config::Config, interpreter::runtime::headless::HeadlessHost, run_source};
///
/// let source = "\
/// solar_def greet(who):
///     print who
/// end
/// ui window main
/// ui button main hello \"Hi\" at 10 10 do greet \"world\"
/// ui run main";
///
/// let mut host = HeadlessHost::new(false);
/// host.press("hello");
/// host.press("hello");
/// let runtime = run_source(source, host, &Config::default()).unwrap();
/// assert_eq!(runtime.host().output(), ["world", "world"]);
/// ```
#[derive(Debug, Default)]
pub struct HeadlessHost {
    windows:   BTreeMap<String, Window>,
    widgets:   BTreeMap<String, Widget>,
    ui_values: HashMap<String, Value>,
    bindings:  HashMap<(String, String), Callback>,
    canvases:  BTreeMap<String, Canvas>,
    held_keys: BTreeSet<String>,
    actions:   VecDeque<Action>,
    frames:    usize,
    output:    Vec<String>,
    verbatim:  Vec<String>,
    echo:      bool,
}

impl HeadlessHost {
    /// Creates a host with no scripted actions and no frames.
    #[must_use]
    pub fn new(echo: bool) -> Self {
        Self { echo, ..Self::default() }
    }

    /// Sets how many frames `loop` blocks get in total.
    #[must_use]
    pub const fn with_frames(mut self, frames: usize) -> Self {
        self.frames = frames;
        self
    }

    /// Queues a press of a button.
    pub fn press(&mut self, widget: &str) -> &mut Self {
        self.actions.push_back(Action::Press { widget: widget.to_string() });
        self
    }

    /// Queues typing into an entry. The entry's value is replaced.
    pub fn type_text(&mut self, widget: &str, text: &str) -> &mut Self {
        self.actions.push_back(Action::Type { widget: widget.to_string(),
                                              text:   text.to_string(), });
        self
    }

    /// Queues a key press in a window, for `ui bind`.
    pub fn queue_key(&mut self, window: &str, key: &str) -> &mut Self {
        self.actions.push_back(Action::Key { window: window.to_string(),
                                             key:    key.to_string(), });
        self
    }

    /// Marks a key as held down, for `gfx key`.
    pub fn hold_key(&mut self, key: &str) -> &mut Self {
        self.held_keys.insert(key.to_string());
        self
    }

    /// Releases a held key.
    pub fn release_key(&mut self, key: &str) -> &mut Self {
        self.held_keys.remove(key);
        self
    }

    /// Program output so far, one entry per print.
    #[must_use]
    pub fn output(&self) -> &[String] {
        &self.output
    }

    /// Passthrough text received, in program order.
    #[must_use]
    pub fn verbatim_blocks(&self) -> &[String] {
        &self.verbatim
    }

    /// Looks up a window.
    #[must_use]
    pub fn window(&self, name: &str) -> Option<&Window> {
        self.windows.get(name)
    }

    /// Looks up a widget.
    #[must_use]
    pub fn widget(&self, name: &str) -> Option<&Widget> {
        self.widgets.get(name)
    }

    /// Looks up a canvas.
    #[must_use]
    pub fn canvas(&self, name: &str) -> Option<&Canvas> {
        self.canvases.get(name)
    }

    /// The current value of a UI variable.
    #[must_use]
    pub fn ui_value(&self, name: &str) -> Option<&Value> {
        self.ui_values.get(name)
    }

    fn ui(&mut self, cmd: &Command<'_>) -> Result<Reply, HostError> {
        match cmd.sub_command() {
            "window" => {
                let name = cmd.text(0)?.to_string();
                self.windows.insert(name.clone(),
                                    Window { title: name,
                                             ..Window::default() });
            },
            "title" => {
                let title = self.text_arg(cmd, 1)?;
                self.window_mut(cmd.text(0)?)?.title = title;
            },
            "size" => {
                let (width, height) = (cmd.number(1)?, cmd.number(2)?);
                let window = self.window_mut(cmd.text(0)?)?;
                window.width = width;
                window.height = height;
            },
            "bg" => {
                let color = self.text_arg(cmd, 1)?;
                self.window_mut(cmd.text(0)?)?.bg = Some(color);
            },
            "fg" => {
                let color = self.text_arg(cmd, 1)?;
                self.window_mut(cmd.text(0)?)?.fg = Some(color);
            },
            "label" => {
                let text = self.text_arg(cmd, 2)?;
                self.place(cmd, "label", text, None)?;
            },
            "button" => {
                let text = self.text_arg(cmd, 2)?;
                let start = cmd.after("do")?;
                let callback = Callback { function: cmd.text(start)?.to_string(),
                                          args:     cmd.tokens().split_off(start + 1), };
                self.place(cmd, "button", text, Some(callback))?;
            },
            "entry" => return self.place_variable(cmd, "entry", String::new(), Value::from("")),
            "checkbox" => {
                let text = self.text_arg(cmd, 2)?;
                return self.place_variable(cmd, "checkbox", text, Value::Integer(0));
            },
            "slider" => {
                let from = cmd.after("from")?;
                cmd.number(from)?;
                cmd.number(cmd.after("to")?)?;
                return self.place_variable(cmd, "slider", String::new(), cmd.value(from)?);
            },
            "bind" => {
                let window = cmd.text(0)?.to_string();
                self.window_mut(&window)?;
                let key = cmd.text(1)?.to_string();
                let start = cmd.after("do")?;
                let callback = Callback { function: cmd.text(start)?.to_string(),
                                          args:     cmd.tokens().split_off(start + 1), };
                self.bindings.insert((window, key), callback);
            },
            "text" => {
                let text = self.text_arg(cmd, 1)?;
                let name = cmd.text(0)?;
                self.widgets
                    .get_mut(name)
                    .ok_or_else(|| unknown("widget", name))?
                    .text = text;
            },
            "set" => {
                let name = cmd.text(0)?;
                let value = cmd.value(1)?;
                *self.ui_values.get_mut(name).ok_or_else(|| unknown("UI variable", name))? = value;
            },
            "get" => {
                let name = cmd.text(0)?;
                let value = self.ui_values
                                .get(name)
                                .cloned()
                                .ok_or_else(|| unknown("UI variable", name))?;
                return Ok(Reply::Store { name: cmd.text(cmd.after("into")?)?.to_string(),
                                         value });
            },
            "run" => {
                let handle = cmd.text(0)?;
                self.window_mut(handle)?;
                return Ok(Reply::EventLoop { handle: handle.to_string() });
            },
            _ => return Err(HostError::Unsupported { command: cmd.name() }),
        }
        Ok(Reply::Done)
    }

    fn gfx(&mut self, cmd: &Command<'_>) -> Result<Reply, HostError> {
        if cmd.sub_command() == "screen" {
            let canvas = Canvas { width: cmd.number(1)?,
                                  height: cmd.number(2)?,
                                  ..Canvas::default() };
            self.canvases.insert(cmd.text(0)?.to_string(), canvas);
            return Ok(Reply::Done);
        }

        let name = cmd.text(0)?;
        if !self.canvases.contains_key(name) {
            return Err(unknown("screen", name));
        }
        let draw = match cmd.sub_command() {
            "clear" => DrawCall::Clear { color: self.text_arg(cmd, 1)? },
            "present" => {
                self.canvas_mut(name)?.presented += 1;
                return Ok(Reply::Done);
            },
            "rect" => {
                let (at, size) = (cmd.after("at")?, cmd.after("size")?);
                DrawCall::Rect { color:  self.text_arg(cmd, 1)?,
                                 x:      cmd.number(at)?,
                                 y:      cmd.number(at + 1)?,
                                 width:  cmd.number(size)?,
                                 height: cmd.number(size + 1)?, }
            },
            "circle" => {
                let at = cmd.after("at")?;
                DrawCall::Circle { color:  self.text_arg(cmd, 1)?,
                                   x:      cmd.number(at)?,
                                   y:      cmd.number(at + 1)?,
                                   radius: cmd.number(cmd.after("radius")?)?, }
            },
            "text" => {
                let at = cmd.after("at")?;
                DrawCall::Text { color: self.text_arg(cmd, 1)?,
                                 text:  self.text_arg(cmd, 2)?,
                                 x:     cmd.number(at)?,
                                 y:     cmd.number(at + 1)?, }
            },
            "key" => {
                let held = self.held_keys.contains(cmd.text(1)?);
                return Ok(Reply::Store { name:  cmd.text(cmd.after("into")?)?.to_string(),
                                         value: Value::Bool(held), });
            },
            _ => return Err(HostError::Unsupported { command: cmd.name() }),
        };

        let canvas = self.canvas_mut(name)?;
        if matches!(draw, DrawCall::Clear { .. }) {
            canvas.draws.clear();
        }
        canvas.draws.push(draw);
        Ok(Reply::Done)
    }

    /// Argument `index` as display text. Handles show their current value.
    fn text_arg(&self, cmd: &Command<'_>, index: usize) -> Result<String, HostError> {
        Ok(display_value(self, &cmd.value(index)?))
    }

    fn window_mut(&mut self, name: &str) -> Result<&mut Window, HostError> {
        self.windows.get_mut(name).ok_or_else(|| unknown("window", name))
    }

    fn canvas_mut(&mut self, name: &str) -> Result<&mut Canvas, HostError> {
        self.canvases.get_mut(name).ok_or_else(|| unknown("screen", name))
    }

    /// Creates a widget from `window name ... at x y`.
    fn place(&mut self,
             cmd: &Command<'_>,
             kind: &'static str,
             text: String,
             callback: Option<Callback>)
             -> Result<(), HostError> {
        let at = cmd.after("at")?;
        let (x, y) = (cmd.number(at)?, cmd.number(at + 1)?);
        let window = cmd.text(0)?.to_string();
        let fg = self.window_mut(&window)?.fg.clone();
        let name = cmd.text(1)?.to_string();
        debug!(kind, widget = %name, window = %window, "widget placed");
        self.widgets.insert(name,
                            Widget { kind,
                                     window,
                                     text,
                                     x,
                                     y,
                                     fg,
                                     callback });
        Ok(())
    }

    /// Creates a widget backed by a UI variable and binds a handle to it
    /// under the widget's name.
    fn place_variable(&mut self,
                      cmd: &Command<'_>,
                      kind: &'static str,
                      text: String,
                      initial: Value)
                      -> Result<Reply, HostError> {
        self.place(cmd, kind, text, None)?;
        let name = cmd.text(1)?.to_string();
        self.ui_values.insert(name.clone(), initial);
        let handle = Handle { kind: kind.to_string(),
                              name: name.clone() };
        Ok(Reply::Store { name,
                          value: Value::Handle(handle) })
    }

    /// The window an action happens in.
    fn action_window<'a>(&'a self, action: &'a Action) -> Option<&'a str> {
        match action {
            Action::Press { widget } | Action::Type { widget, .. } => {
                self.widgets.get(widget).map(|w| w.window.as_str())
            },
            Action::Key { window, .. } => Some(window.as_str()),
        }
    }

    fn perform(&mut self, action: Action) -> Option<Event> {
        match action {
            Action::Press { widget } => {
                let callback = self.widgets.get(&widget)?.callback.clone()?;
                Some(Event::Invoke { function: callback.function,
                                     args:     callback.args, })
            },
            Action::Type { widget, text } => {
                match self.ui_values.get_mut(&widget) {
                    Some(slot) => *slot = Value::from(text),
                    None => warn!(widget = %widget, "typed into a widget without a value"),
                }
                None
            },
            Action::Key { window, key } => {
                let callback = self.bindings.get(&(window, key))?.clone();
                Some(Event::Invoke { function: callback.function,
                                     args:     callback.args, })
            },
        }
    }
}

fn unknown(kind: &str, name: &str) -> HostError {
    HostError::UnknownHandle { kind: kind.to_string(),
                               name: name.to_string(), }
}

impl Host for HeadlessHost {
    fn dispatch(&mut self, command: &Command<'_>) -> Result<Reply, HostError> {
        match command.category() {
            "ui" => self.ui(command),
            "gfx" => self.gfx(command),
            _ => Err(HostError::Unsupported { command: command.name() }),
        }
    }

    fn poll(&mut self, handle: &str) -> Option<Event> {
        loop {
            let index = self.actions
                            .iter()
                            .position(|action| self.action_window(action) == Some(handle))?;
            let action = self.actions.remove(index)?;
            debug!(?action, handle, "replaying action");
            if let Some(event) = self.perform(action) {
                return Some(event);
            }
        }
    }

    fn frame(&mut self, handle: &str) -> bool {
        if self.frames == 0 {
            return false;
        }
        self.frames -= 1;
        debug!(handle, remaining = self.frames, "frame");
        true
    }

    fn emit(&mut self, text: &str) {
        if self.echo {
            println!("{text}");
        }
        self.output.push(text.to_string());
    }

    fn verbatim(&mut self, text: &str) {
        debug!(lines = text.lines().count(), "passthrough");
        self.verbatim.push(text.to_string());
    }

    fn read(&self, handle: &Handle) -> Option<Value> {
        self.ui_values.get(&handle.name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ast::{ExternalCommand, Statement},
        interpreter::{parser::external::parse_external_command, tokenizer::tokenize},
    };

    fn command(line: &str) -> ExternalCommand {
        let tokens = tokenize(line, 1).unwrap();
        let Ok(Statement::ExternalCommand(cmd)) = parse_external_command(&tokens[0].text, &tokens[1..], 1) else {
            panic!("not an external command: {line}");
        };
        cmd
    }

    fn send(host: &mut HeadlessHost, line: &str) -> Result<Reply, HostError> {
        let scope: HashMap<String, Value> = HashMap::from([("w".to_string(), Value::Integer(40))]);
        host.dispatch(&Command::new(&command(line), &scope))
    }

    #[test]
    fn widgets_need_their_window() {
        let mut host = HeadlessHost::new(false);
        let err = send(&mut host, r#"ui label main hi "Hi" at 0 0"#).unwrap_err();
        assert_eq!(err,
                   HostError::UnknownHandle { kind: "window".into(),
                                              name: "main".into() });
    }

    #[test]
    fn entries_bind_a_handle_and_read_back() {
        let mut host = HeadlessHost::new(false);
        send(&mut host, "ui window main").unwrap();
        let reply = send(&mut host, "ui entry main name at 5 5").unwrap();
        assert_eq!(reply,
                   Reply::Store { name:  "name".into(),
                                  value: Value::Handle(Handle { kind: "entry".into(),
                                                                name: "name".into(), }), });

        send(&mut host, r#"ui set name "Ada""#).unwrap();
        let reply = send(&mut host, "ui get name into who").unwrap();
        assert_eq!(reply,
                   Reply::Store { name:  "who".into(),
                                  value: Value::from("Ada"), });
    }

    #[test]
    fn buttons_keep_raw_callback_tokens() {
        let mut host = HeadlessHost::new(false);
        send(&mut host, "ui window main").unwrap();
        send(&mut host, r#"ui button main go "Go" at 1 2 do greet name "x""#).unwrap();
        let callback = host.widget("go").and_then(|w| w.callback.clone()).unwrap();
        assert_eq!(callback.function, "greet");
        assert_eq!(callback.args, vec![Token::bare("name"), Token::quoted("x")]);
    }

    #[test]
    fn events_are_served_per_window() {
        let mut host = HeadlessHost::new(false);
        send(&mut host, "ui window a").unwrap();
        send(&mut host, "ui window b").unwrap();
        send(&mut host, "ui button a one \"1\" at 0 0 do f").unwrap();
        send(&mut host, "ui bind b space do g").unwrap();
        host.queue_key("b", "space").press("one");

        assert!(matches!(host.poll("a"), Some(Event::Invoke { ref function, .. }) if function == "f"));
        assert_eq!(host.poll("a"), None);
        assert!(matches!(host.poll("b"), Some(Event::Invoke { ref function, .. }) if function == "g"));
    }

    #[test]
    fn typing_updates_the_entry_without_an_event() {
        let mut host = HeadlessHost::new(false);
        send(&mut host, "ui window main").unwrap();
        send(&mut host, "ui entry main name at 0 0").unwrap();
        host.type_text("name", "Grace");
        assert_eq!(host.poll("main"), None);
        assert_eq!(host.ui_value("name"), Some(&Value::from("Grace")));
    }

    #[test]
    fn drawing_resolves_variables_and_clear_resets() {
        let mut host = HeadlessHost::new(false);
        send(&mut host, "gfx screen s 320 200").unwrap();
        send(&mut host, "gfx rect s red at 1 2 size w 10").unwrap();
        assert_eq!(host.canvas("s").unwrap().draws,
                   vec![DrawCall::Rect { color:  "red".into(),
                                         x:      1.0,
                                         y:      2.0,
                                         width:  40.0,
                                         height: 10.0, }]);
        send(&mut host, "gfx clear s black").unwrap();
        send(&mut host, "gfx present s").unwrap();
        let canvas = host.canvas("s").unwrap();
        assert_eq!(canvas.draws.len(), 1);
        assert_eq!(canvas.presented, 1);
    }

    #[test]
    fn non_numeric_coordinates_are_rejected() {
        let mut host = HeadlessHost::new(false);
        send(&mut host, "gfx screen s 10 10").unwrap();
        let err = send(&mut host, "gfx circle s red at left 2 radius 3").unwrap_err();
        assert!(matches!(err, HostError::BadArgument { .. }));
    }

    #[test]
    fn key_reads_the_held_state() {
        let mut host = HeadlessHost::new(false);
        host.hold_key("left");
        send(&mut host, "gfx screen s 10 10").unwrap();
        assert_eq!(send(&mut host, "gfx key s left into moving").unwrap(),
                   Reply::Store { name:  "moving".into(),
                                  value: Value::Bool(true), });
        assert_eq!(send(&mut host, "gfx key s right into moving").unwrap(),
                   Reply::Store { name:  "moving".into(),
                                  value: Value::Bool(false), });
    }

    #[test]
    fn frame_budget_is_shared() {
        let mut host = HeadlessHost::new(false).with_frames(2);
        assert!(host.frame("s"));
        assert!(host.frame("t"));
        assert!(!host.frame("s"));
    }
}
