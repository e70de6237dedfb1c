//! In-memory stand-in for the object server.
//!
//! Usage: `fake_server [--creates N] [--handshake MARKER] -- <plugin> [args...]`
//!
//! Spawns the plugin with piped stdio, writes the handshake marker and answers
//! requests until `N` objects have been deleted, then closes the plugin's stdin
//! and prints a one-line JSON summary on stdout.

use std::collections::BTreeMap;
use std::io::{BufRead, BufReader, Write};
use std::process::{Command, Stdio};

use ppm_driver::codec::{decode_object, encode_object};
use ppm_driver::{ManagedObject, ObjectId, HANDSHAKE};
use serde_json::{json, Value};

struct Options {
    creates: u64,
    handshake: Vec<u8>,
    plugin: Vec<String>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let options = parse_args(std::env::args().skip(1))?;
    let (program, plugin_args) = options
        .plugin
        .split_first()
        .ok_or("missing plugin command after `--`")?;

    let mut child = Command::new(program)
        .args(plugin_args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .spawn()?;

    let mut stdin = Some(child.stdin.take().ok_or("failed to capture plugin stdin")?);
    let stdout = child.stdout.take().ok_or("failed to capture plugin stdout")?;

    if let Some(input) = stdin.as_mut() {
        input.write_all(&options.handshake)?;
        input.flush()?;
    }

    let mut table = ObjectTable::default();
    let mut requests = 0u64;
    for line in BufReader::new(stdout).lines() {
        let line = line?;
        requests += 1;

        let request: Value = serde_json::from_str(&line)?;
        if let (Some(reply), Some(input)) = (table.handle(&request), stdin.as_mut()) {
            writeln!(input, "{reply}")?;
            input.flush()?;
        }

        if table.deleted >= options.creates {
            // Closing stdin is how the server tells a plugin to wind down.
            stdin.take();
            break;
        }
    }

    drop(stdin);
    let status = child.wait()?;
    let summary = json!({
        "requests": requests,
        "created": table.created,
        "deleted": table.deleted,
        "live": table.objects.len(),
        "exit_code": status.code(),
    });
    println!("{summary}");
    Ok(())
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Options, String> {
    let mut options = Options {
        creates: 1,
        handshake: HANDSHAKE.to_vec(),
        plugin: Vec::new(),
    };

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--creates" => {
                let value = args.next().ok_or("--creates needs a value")?;
                options.creates = value
                    .parse()
                    .map_err(|err| format!("invalid --creates value {value}: {err}"))?;
            }
            "--handshake" => {
                let value = args.next().ok_or("--handshake needs a value")?;
                options.handshake = value.into_bytes();
            }
            "--" => {
                options.plugin = args.by_ref().collect();
            }
            other => return Err(format!("unexpected argument {other}")),
        }
    }

    Ok(options)
}

#[derive(Default)]
struct ObjectTable {
    objects: BTreeMap<ObjectId, ManagedObject>,
    last_id: ObjectId,
    created: u64,
    deleted: u64,
}

impl ObjectTable {
    /// Apply a request. Requests with id 0 are notifications and get no reply.
    fn handle(&mut self, request: &Value) -> Option<Value> {
        let id = request.get("id").and_then(Value::as_u64).unwrap_or(0);
        let method = request.get("method").and_then(Value::as_str).unwrap_or("");
        let param = request
            .get("params")
            .and_then(|params| params.get(0))
            .cloned()
            .unwrap_or(Value::Null);

        let outcome = match method {
            "Server.CreateObject" => self.create(&param),
            "Server.DeleteObject" => self.delete(&param),
            "Server.QueryObject" => self.query(&param),
            other => Err(json!(format!("unknown method: {other}"))),
        };

        if id == 0 {
            return None;
        }
        Some(match outcome {
            Ok(result) => json!({ "id": id, "result": result }),
            Err(error) => json!({ "id": id, "error": error }),
        })
    }

    fn create(&mut self, param: &Value) -> Result<Value, Value> {
        let object = decode_object(param).map_err(|_| json!(0))?;
        self.last_id += 1;
        self.objects.insert(self.last_id, object);
        self.created += 1;
        Ok(json!(self.last_id))
    }

    fn delete(&mut self, param: &Value) -> Result<Value, Value> {
        match param.as_u64().and_then(|id| self.objects.remove(&id)) {
            Some(_) => {
                self.deleted += 1;
                Ok(json!(true))
            }
            None => Err(json!(false)),
        }
    }

    fn query(&self, param: &Value) -> Result<Value, Value> {
        param
            .as_u64()
            .and_then(|id| self.objects.get(&id))
            .map(encode_object)
            .ok_or_else(|| json!(format!("Failed to query object with id: {param}")))
    }
}
