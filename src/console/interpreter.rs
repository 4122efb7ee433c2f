//! The read-eval-print loop and its command handlers.
//!
//! Every command is independent: the only state across lines is the store.
//! Usage problems (missing or unknown kind, missing id, missing attribute
//! or value, no such instance) are recovered locally as one fixed
//! diagnostic line. Persistence and coercion failures are fatal and
//! propagate out of [`Console::run`].

use std::io::{BufRead, Write};

use serde_json::Value;

use crate::entity::{AttrType, Entity, EntityKind};
use crate::error::{HearthError, Result};
use crate::storage::FileStore;

use super::command::{parse_dotted, DottedCall};

const CLASS_MISSING: &str = "** class name missing **";
const CLASS_UNKNOWN: &str = "** class doesn't exist **";
const ID_MISSING: &str = "** instance id missing **";
const NOT_FOUND: &str = "** no instance found **";
const ATTR_MISSING: &str = "** attribute name missing **";
const VALUE_MISSING: &str = "** value missing **";

pub struct Console<W: Write> {
    store: FileStore,
    out: W,
}

impl<W: Write> Console<W> {
    pub fn new(store: FileStore, out: W) -> Self {
        Self { store, out }
    }

    pub fn into_store(self) -> FileStore {
        self.store
    }

    /// Run the loop until `quit` or end-of-input. `prompt` controls whether
    /// a prompt is written before each read (interactive sessions only).
    pub fn run(&mut self, mut input: impl BufRead, prompt: bool) -> Result<()> {
        let mut line = String::new();
        loop {
            if prompt {
                write!(self.out, "(hearth) ")?;
                self.out.flush()?;
            }
            line.clear();
            if input.read_line(&mut line)? == 0 {
                return Ok(());
            }
            if !self.dispatch(line.trim())? {
                return Ok(());
            }
        }
    }

    /// Execute one command line. Returns `false` when the loop should end.
    /// Empty lines and unrecognized input do nothing.
    pub fn dispatch(&mut self, line: &str) -> Result<bool> {
        let mut tokens = line.split_whitespace();
        let Some(command) = tokens.next() else {
            return Ok(true);
        };
        let args: Vec<&str> = tokens.collect();
        match command {
            "quit" | "EOF" => return Ok(false),
            "help" => self.cmd_help()?,
            "create" => self.cmd_create(&args)?,
            "show" => self.cmd_show(&args)?,
            "destroy" => self.cmd_destroy(&args)?,
            "all" => self.cmd_all(&args)?,
            "update" => self.cmd_update(&args)?,
            _ => self.dispatch_dotted(line)?,
        }
        Ok(true)
    }

    fn dispatch_dotted(&mut self, line: &str) -> Result<()> {
        let Some(call) = parse_dotted(line) else {
            return Ok(());
        };
        match call {
            DottedCall::All(kind) => self.cmd_all(&[kind.name()]),
            DottedCall::Count(kind) => {
                writeln!(self.out, "{}", self.store.count(kind))?;
                Ok(())
            }
            DottedCall::Show(kind, id) => self.cmd_show(&[kind.name(), &id]),
            DottedCall::Destroy(kind, id) => self.cmd_destroy(&[kind.name(), &id]),
            DottedCall::Update { kind, id, field, value } => {
                self.cmd_update(&[kind.name(), &id, &field, &value])
            }
            DottedCall::UpdateMap { kind, id, pairs } => {
                for (field, value) in &pairs {
                    self.cmd_update(&[kind.name(), &id, field, value])?;
                }
                Ok(())
            }
        }
    }

    fn cmd_help(&mut self) -> Result<()> {
        writeln!(self.out, "create <Kind>                        create a record, print its id")?;
        writeln!(self.out, "show <Kind> <id>                     print one record")?;
        writeln!(self.out, "destroy <Kind> <id>                  delete one record")?;
        writeln!(self.out, "all [<Kind>]                         list records, optionally one kind")?;
        writeln!(self.out, "update <Kind> <id> <attr> <value>    set an attribute")?;
        writeln!(self.out, "<Kind>.all() / .count() / .show(id) / .destroy(id) / .update(...)")?;
        writeln!(self.out, "quit                                 exit")?;
        Ok(())
    }

    fn cmd_create(&mut self, args: &[&str]) -> Result<()> {
        let Some(kind) = self.check_kind(args)? else {
            return Ok(());
        };
        let entity = Entity::new(kind);
        let id = entity.id.clone();
        self.store.register(entity);
        writeln!(self.out, "{id}")?;
        self.store.save()
    }

    fn cmd_show(&mut self, args: &[&str]) -> Result<()> {
        let Some(key) = self.check_key(args)? else {
            return Ok(());
        };
        if let Some(entity) = self.store.get(&key) {
            writeln!(self.out, "{entity}")?;
        }
        Ok(())
    }

    fn cmd_destroy(&mut self, args: &[&str]) -> Result<()> {
        let Some(key) = self.check_key(args)? else {
            return Ok(());
        };
        self.store.remove(&key);
        self.store.save()
    }

    fn cmd_all(&mut self, args: &[&str]) -> Result<()> {
        let entries: Vec<String> = match args.first() {
            None => self.store.all().values().map(ToString::to_string).collect(),
            Some(name) => {
                let Some(kind) = EntityKind::from_name(name) else {
                    writeln!(self.out, "{CLASS_UNKNOWN}")?;
                    return Ok(());
                };
                let prefix = kind.key_prefix();
                self.store
                    .all()
                    .iter()
                    .filter(|(key, _)| key.starts_with(&prefix))
                    .map(|(_, entity)| entity.to_string())
                    .collect()
            }
        };
        let entries: Vec<String> = entries.into_iter().map(|s| format!("\"{s}\"")).collect();
        writeln!(self.out, "[{}]", entries.join(", "))?;
        Ok(())
    }

    fn cmd_update(&mut self, args: &[&str]) -> Result<()> {
        let Some(key) = self.check_key(args)? else {
            return Ok(());
        };
        let Some(field) = args.get(2) else {
            writeln!(self.out, "{ATTR_MISSING}")?;
            return Ok(());
        };
        let Some(value) = args.get(3) else {
            writeln!(self.out, "{VALUE_MISSING}")?;
            return Ok(());
        };
        self.apply_update(&key, field, strip_quotes(value))
    }

    /// Assign one attribute, coercing against the declared type, then
    /// persist. Timestamps are not assignable from the console; `id`
    /// assignment changes the field but never rewrites the registry key.
    fn apply_update(&mut self, key: &str, field: &str, value: &str) -> Result<()> {
        if field == "created_at" || field == "updated_at" {
            return Ok(());
        }
        let Some(entity) = self.store.get_mut(key) else {
            writeln!(self.out, "{NOT_FOUND}")?;
            return Ok(());
        };
        match entity.kind.attr_type(field) {
            Some(AttrType::Str) => {
                entity.attrs.insert(field.into(), Value::from(value));
            }
            Some(AttrType::Int) => {
                let n: i64 = value.parse().map_err(|_| coercion(field, value, AttrType::Int))?;
                entity.attrs.insert(field.into(), Value::from(n));
            }
            Some(AttrType::Float) => {
                let x: f64 = value.parse().map_err(|_| coercion(field, value, AttrType::Float))?;
                entity.attrs.insert(field.into(), Value::from(x));
            }
            Some(AttrType::StrList) => {
                return Err(coercion(field, value, AttrType::StrList));
            }
            None if field == "id" => {
                entity.id = value.to_string();
            }
            None => {
                entity.attrs.insert(field.into(), Value::from(value));
            }
        }
        entity.touch();
        self.store.save()
    }

    /// First two validation steps shared by every command: kind present,
    /// kind recognized.
    fn check_kind(&mut self, args: &[&str]) -> Result<Option<EntityKind>> {
        let Some(name) = args.first() else {
            writeln!(self.out, "{CLASS_MISSING}")?;
            return Ok(None);
        };
        match EntityKind::from_name(name) {
            Some(kind) => Ok(Some(kind)),
            None => {
                writeln!(self.out, "{CLASS_UNKNOWN}")?;
                Ok(None)
            }
        }
    }

    /// Kind, id, and existence checks; yields the composite key.
    fn check_key(&mut self, args: &[&str]) -> Result<Option<String>> {
        let Some(kind) = self.check_kind(args)? else {
            return Ok(None);
        };
        let Some(id) = args.get(1) else {
            writeln!(self.out, "{ID_MISSING}")?;
            return Ok(None);
        };
        let key = format!("{}.{id}", kind.name());
        if !self.store.contains(&key) {
            writeln!(self.out, "{NOT_FOUND}")?;
            return Ok(None);
        }
        Ok(Some(key))
    }
}

fn coercion(field: &str, value: &str, expected: AttrType) -> HearthError {
    HearthError::TypeCoercion {
        field: field.to_string(),
        value: value.to_string(),
        expected: expected.describe(),
    }
}

/// Strip one pair of surrounding double quotes, if present.
fn strip_quotes(value: &str) -> &str {
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        &value[1..value.len() - 1]
    } else {
        value
    }
}
