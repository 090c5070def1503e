// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::render::{render_selection, render_session};
use addressfinder_app::{
    AddressRecord, AddressService, CloseReason, Command, Key, LookupRow, Observer, Request,
    RequestId, Selection, ServiceError, Session, Suggestion,
};
use anyhow::{Context, Result, bail};
use std::collections::VecDeque;
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use tracing::{debug, info};

pub type SharedService = Arc<dyn AddressService + Send + Sync>;

#[derive(Debug)]
pub enum RuntimeEvent {
    Line(String),
    InputClosed,
    LookupDone {
        id: RequestId,
        result: Result<Vec<LookupRow>, ServiceError>,
    },
    RetrieveDone {
        id: RequestId,
        result: Result<Vec<AddressRecord>, ServiceError>,
    },
}

/// One parsed line of terminal input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineCommand {
    Session(Command),
    Help,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub fn parse_line(line: &str) -> Result<LineCommand> {
    let Some(rest) = line.strip_prefix(':') else {
        return Ok(LineCommand::Session(Command::Input(line.to_owned())));
    };

    let mut words = rest.split_whitespace();
    let command = match (words.next(), words.next()) {
        (Some("down" | "d"), None) => Command::Key(Key::Down),
        (Some("up" | "u"), None) => Command::Key(Key::Up),
        (Some("enter" | "e"), None) => Command::Key(Key::Enter),
        (Some("esc"), None) => Command::Key(Key::Escape),
        (Some("focus"), None) => Command::Focus,
        (Some("blur"), None) => Command::Blur,
        (Some("submit"), None) => Command::Submit,
        (Some("back" | "b"), None) => Command::DismissHeader,
        (Some("pick" | "p"), Some(index)) => {
            let index = index
                .parse()
                .with_context(|| format!("invalid row number {index:?}"))?;
            Command::Pick(index)
        }
        (Some("help" | "h"), None) => return Ok(LineCommand::Help),
        (Some("quit" | "q"), None) => return Ok(LineCommand::Quit),
        _ => bail!("unknown command {line:?}; type :help for the list"),
    };
    Ok(LineCommand::Session(command))
}

pub const HELP: &str = "\
Type address text to search. Commands:
  :down :up        move the highlight
  :enter           select the highlighted row
  :pick <n>        select row n
  :esc :blur       close the list
  :focus           reopen the list
  :submit          close the list as if the form was submitted
  :back            remove the current filter
  :quit            exit
";

/// Prints notifications that a host page would receive as events.
#[derive(Debug, Default)]
struct TerminalObserver {
    selections: Vec<Selection>,
}

impl Observer for TerminalObserver {
    fn opened(&mut self) {
        debug!("list opened");
    }

    fn closed(&mut self, reason: CloseReason) {
        debug!(reason = reason.as_str(), "list closed");
    }

    fn highlighted(&mut self, suggestion: &Suggestion) {
        debug!(label = suggestion.label.as_str(), "highlight moved");
    }

    fn select_complete(&mut self, selection: &Selection) {
        info!(id = selection.suggestion.value.as_str(), "address selected");
        self.selections.push(selection.clone());
    }
}

/// Serializes terminal lines and service completions through one channel.
/// Service calls run on worker threads.
pub struct Runtime {
    session: Session,
    service: SharedService,
    observer: TerminalObserver,
    tx: Sender<RuntimeEvent>,
    rx: Receiver<RuntimeEvent>,
    // Navigation lines wait here until the results they act on have arrived.
    deferred: VecDeque<String>,
    input_closed: bool,
}

impl Runtime {
    pub fn new(session: Session, service: SharedService) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            session,
            service,
            observer: TerminalObserver::default(),
            tx,
            rx,
            deferred: VecDeque::new(),
            input_closed: false,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn selections(&self) -> &[Selection] {
        &self.observer.selections
    }

    pub fn sender(&self) -> Sender<RuntimeEvent> {
        self.tx.clone()
    }

    /// Reads stdin on a background thread until it closes.
    pub fn spawn_stdin_reader(&self) {
        let tx = self.sender();
        thread::spawn(move || {
            for line in io::stdin().lock().lines() {
                let Ok(line) = line else {
                    break;
                };
                if tx.send(RuntimeEvent::Line(line)).is_err() {
                    return;
                }
            }
            let _ = tx.send(RuntimeEvent::InputClosed);
        });
    }

    pub fn run<W: Write>(&mut self, out: &mut W) -> Result<()> {
        render_session(&self.session, out).context("render")?;
        while let Ok(event) = self.rx.recv() {
            if self.handle(event, out)? == Flow::Quit {
                break;
            }
        }
        Ok(())
    }

    /// Blocks for the next event and applies it.
    pub fn step<W: Write>(&mut self, out: &mut W) -> Result<Flow> {
        let event = self.rx.recv().context("event channel closed")?;
        self.handle(event, out)
    }

    pub fn pending(&self) -> bool {
        self.session.lookup_pending() || self.session.retrieve_pending()
    }

    pub fn handle<W: Write>(&mut self, event: RuntimeEvent, out: &mut W) -> Result<Flow> {
        match event {
            RuntimeEvent::Line(line) => {
                if line.starts_with(':') && self.pending() {
                    debug!(line = line.as_str(), "deferring command until results arrive");
                    self.deferred.push_back(line);
                    return Ok(Flow::Continue);
                }
                if self.apply_line(&line, out)? == Flow::Quit {
                    return Ok(Flow::Quit);
                }
            }
            RuntimeEvent::InputClosed => {
                self.input_closed = true;
            }
            RuntimeEvent::LookupDone { id, result } => {
                self.session.complete_lookup(id, result, &mut self.observer);
                render_session(&self.session, out).context("render")?;
            }
            RuntimeEvent::RetrieveDone { id, result } => {
                let before = self.observer.selections.len();
                self.session
                    .complete_retrieve(id, result, &mut self.observer);
                for selection in &self.observer.selections[before..] {
                    render_selection(selection, out).context("render selection")?;
                }
                render_session(&self.session, out).context("render")?;
            }
        }

        while !self.pending() {
            let Some(line) = self.deferred.pop_front() else {
                break;
            };
            if self.apply_line(&line, out)? == Flow::Quit {
                return Ok(Flow::Quit);
            }
        }

        if self.input_closed && self.deferred.is_empty() && !self.pending() {
            return Ok(Flow::Quit);
        }
        Ok(Flow::Continue)
    }

    fn apply_line<W: Write>(&mut self, line: &str, out: &mut W) -> Result<Flow> {
        let command = match parse_line(line) {
            Ok(LineCommand::Session(command)) => command,
            Ok(LineCommand::Help) => {
                write!(out, "{HELP}").context("write help")?;
                return Ok(Flow::Continue);
            }
            Ok(LineCommand::Quit) => return Ok(Flow::Quit),
            Err(error) => {
                writeln!(out, "{error:#}").context("write error")?;
                return Ok(Flow::Continue);
            }
        };

        let requests = self.session.dispatch(command, &mut self.observer);
        for request in requests {
            self.execute(request);
        }
        render_session(&self.session, out).context("render")?;
        Ok(Flow::Continue)
    }

    fn execute(&self, request: Request) {
        let service = Arc::clone(&self.service);
        let tx = self.sender();
        thread::spawn(move || {
            let event = match request {
                Request::Lookup { id, query } => RuntimeEvent::LookupDone {
                    id,
                    result: service.find(&query),
                },
                Request::Retrieve { id, query } => RuntimeEvent::RetrieveDone {
                    id,
                    result: service.retrieve(&query),
                },
            };
            let _ = tx.send(event);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::{Flow, LineCommand, Runtime, RuntimeEvent, SharedService, parse_line};
    use addressfinder_app::{Command, Key, Phase, ServiceError, Session, WidgetConfig};
    use addressfinder_testkit::{ScriptedService, address_record, address_row, collection_row};
    use anyhow::Result;
    use std::sync::Arc;

    fn runtime(service: &Arc<ScriptedService>) -> Runtime {
        let shared: SharedService = service.clone();
        Runtime::new(Session::new(WidgetConfig::default()), shared)
    }

    fn send_line(runtime: &mut Runtime, out: &mut Vec<u8>, line: &str) -> Result<Flow> {
        runtime.handle(RuntimeEvent::Line(line.to_owned()), out)
    }

    fn settle(runtime: &mut Runtime, out: &mut Vec<u8>) -> Result<()> {
        while runtime.pending() {
            runtime.step(out)?;
        }
        Ok(())
    }

    #[test]
    fn parse_line_maps_commands() -> Result<()> {
        assert_eq!(
            parse_line("10 downing")?,
            LineCommand::Session(Command::Input("10 downing".to_owned()))
        );
        assert_eq!(
            parse_line(":down")?,
            LineCommand::Session(Command::Key(Key::Down))
        );
        assert_eq!(parse_line(":pick 3")?, LineCommand::Session(Command::Pick(3)));
        assert_eq!(
            parse_line(":back")?,
            LineCommand::Session(Command::DismissHeader)
        );
        assert_eq!(parse_line(":q")?, LineCommand::Quit);
        Ok(())
    }

    #[test]
    fn parse_line_rejects_unknown_commands() {
        let error = parse_line(":teleport").expect_err("unknown command should fail");
        assert!(error.to_string().contains(":help"));
        assert!(parse_line(":pick two").is_err());
    }

    #[test]
    fn typed_text_runs_a_lookup_on_a_worker() -> Result<()> {
        let service = Arc::new(ScriptedService::new());
        service.push_lookup(Ok(vec![address_row("10 Downing Street, London", "A1")]));
        let mut runtime = runtime(&service);
        let mut out = Vec::new();

        send_line(&mut runtime, &mut out, "10 downing")?;
        assert!(runtime.pending());
        settle(&mut runtime, &mut out)?;

        assert_eq!(runtime.session().suggestions().len(), 1);
        let lookups = service.lookups();
        assert_eq!(lookups.len(), 1);
        assert_eq!(lookups[0].query, "10 downing");
        assert!(String::from_utf8(out)?.contains("1 result found"));
        Ok(())
    }

    #[test]
    fn navigation_waits_for_pending_results() -> Result<()> {
        let service = Arc::new(ScriptedService::new());
        service.push_lookup(Ok(vec![collection_row("Leeds, West Yorkshire", "L1", 900)]));
        service.push_lookup(Ok(vec![address_row("1 Leeds Road", "A1")]));
        let mut runtime = runtime(&service);
        let mut out = Vec::new();

        send_line(&mut runtime, &mut out, "leeds")?;
        send_line(&mut runtime, &mut out, ":pick 0")?;
        assert!(runtime.session().filters().is_empty());

        settle(&mut runtime, &mut out)?;

        let lookups = service.lookups();
        assert_eq!(lookups.len(), 2);
        assert_eq!(lookups[1].path_filter.as_deref(), Some("L1"));
        assert_eq!(runtime.session().suggestions()[0].value, "A1");
        Ok(())
    }

    #[test]
    fn selecting_an_address_prints_the_retrieved_fields() -> Result<()> {
        let service = Arc::new(ScriptedService::new());
        service.push_lookup(Ok(vec![address_row("10 Downing Street, London", "A1")]));
        service.push_retrieve(Ok(vec![address_record(&[
            ("addressline1", "10 Downing Street"),
            ("postcode", "SW1A 2AA"),
        ])]));
        let mut runtime = runtime(&service);
        let mut out = Vec::new();

        send_line(&mut runtime, &mut out, "10 downing")?;
        send_line(&mut runtime, &mut out, ":down")?;
        send_line(&mut runtime, &mut out, ":enter")?;
        settle(&mut runtime, &mut out)?;

        assert_eq!(runtime.selections().len(), 1);
        assert_eq!(runtime.session().phase(), Phase::AddressSelected);
        assert_eq!(service.retrievals()[0].id, "A1");
        let text = String::from_utf8(out)?;
        assert!(text.contains("postcode: SW1A 2AA"));
        Ok(())
    }

    #[test]
    fn service_failure_is_rendered_as_status() -> Result<()> {
        let service = Arc::new(ScriptedService::new());
        service.push_lookup(Err(ServiceError::Connection {
            endpoint: "http://127.0.0.1:1/pcw/autocomplete/find".to_owned(),
            detail: "connection refused".to_owned(),
        }));
        let mut runtime = runtime(&service);
        let mut out = Vec::new();

        send_line(&mut runtime, &mut out, "leeds")?;
        settle(&mut runtime, &mut out)?;

        assert_eq!(runtime.session().phase(), Phase::ConnectionError);
        assert!(String::from_utf8(out)?.contains("[status] Connection error"));
        Ok(())
    }

    #[test]
    fn closed_input_quits_once_work_drains() -> Result<()> {
        let service = Arc::new(ScriptedService::new());
        service.push_lookup(Ok(vec![address_row("1 High Street", "A1")]));
        let mut runtime = runtime(&service);
        let mut out = Vec::new();

        send_line(&mut runtime, &mut out, "high street")?;
        assert_eq!(
            runtime.handle(RuntimeEvent::InputClosed, &mut out)?,
            Flow::Continue
        );
        assert_eq!(runtime.step(&mut out)?, Flow::Quit);
        Ok(())
    }

    #[test]
    fn quit_and_help_lines_are_handled_locally() -> Result<()> {
        let service = Arc::new(ScriptedService::new());
        let mut runtime = runtime(&service);
        let mut out = Vec::new();

        assert_eq!(send_line(&mut runtime, &mut out, ":help")?, Flow::Continue);
        assert!(String::from_utf8(out.clone())?.contains(":pick <n>"));
        assert_eq!(send_line(&mut runtime, &mut out, ":quit")?, Flow::Quit);
        assert!(service.lookups().is_empty());
        Ok(())
    }
}
