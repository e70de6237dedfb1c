use std::fs::{File, OpenOptions};
use std::io::{BufRead, ErrorKind, Write};
use std::thread;
use std::time::Instant;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::codec::{decode_object, encode_line, Response, ResponseBody};
use crate::config::DriverConfig;
use crate::error::{DriverError, DriverResult};
use crate::handshake::wait_for_header;
use crate::model::{Action, ManagedObject, ObjectId};
use crate::scenario::ObjectRandomizer;
use crate::signal::StopSignal;

/// Where the driver is in its create/cool/delete cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    AwaitingHandshake,
    Idle,
    /// Blocked on a reply line: the create result in the main cycle, or a
    /// query or acknowledged-delete reply.
    AwaitingResponse,
    Cooling,
    Stopped,
}

/// Why [`Driver::run`] returned without an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The stop signal was triggered.
    Interrupted,
    /// The configured number of cycles completed.
    CycleLimit,
    /// The server closed its end of the stream.
    StreamClosed,
}

/// Single-owner client for the object server protocol.
///
/// Requests and responses strictly alternate: every request that expects a
/// reply consumes exactly one line before the next request goes out.
pub struct Driver<R, W> {
    reader: R,
    writer: W,
    config: DriverConfig,
    randomizer: ObjectRandomizer,
    stop: StopSignal,
    state: DriverState,
    transcript: Option<File>,
    object: ManagedObject,
    cycles: u64,
}

impl<R: BufRead, W: Write> Driver<R, W> {
    /// Build a driver over an input and output stream.
    ///
    /// Fails only if a configured transcript file cannot be opened.
    pub fn new(reader: R, writer: W, config: DriverConfig) -> DriverResult<Self> {
        let transcript = match &config.transcript_path {
            Some(path) => Some(OpenOptions::new().create(true).append(true).open(path)?),
            None => None,
        };
        let randomizer = ObjectRandomizer::new(
            config.seed,
            config.size_range.clone(),
            config.position_range.clone(),
        );

        Ok(Self {
            reader,
            writer,
            config,
            randomizer,
            stop: StopSignal::new(),
            state: DriverState::AwaitingHandshake,
            transcript,
            object: ManagedObject::default(),
            cycles: 0,
        })
    }

    /// Share an externally owned stop signal (e.g. one wired to Ctrl+C).
    pub fn with_stop_signal(mut self, stop: StopSignal) -> Self {
        self.stop = stop;
        self
    }

    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    /// Completed create/delete cycles.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// The object recycled across iterations, as last sent.
    pub fn object(&self) -> &ManagedObject {
        &self.object
    }

    pub fn into_inner(self) -> (R, W) {
        (self.reader, self.writer)
    }

    /// Validate the `PpM` marker at the start of the input stream.
    pub fn handshake(&mut self) -> DriverResult<()> {
        wait_for_header(&mut self.reader)?;
        debug!("handshake accepted");
        self.state = DriverState::Idle;
        Ok(())
    }

    /// Write one action as a complete line.
    ///
    /// The stop signal is checked first; once triggered nothing more is written.
    pub fn send(&mut self, action: &Action) -> DriverResult<()> {
        if self.stop.is_triggered() {
            return Err(DriverError::Interrupted);
        }

        let line = encode_line(action)?;
        debug!(method = action.method(), id = action.id(), "sending request");
        let written = self
            .writer
            .write_all(&line)
            .and_then(|_| self.writer.flush());
        match written {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::BrokenPipe => Err(DriverError::ConnectionClosed),
            Err(err) => Err(err.into()),
        }
    }

    /// Block for the next response line and return its `result` payload.
    fn await_result(&mut self) -> DriverResult<Value> {
        self.state = DriverState::AwaitingResponse;

        let mut line = Vec::new();
        if self.reader.read_until(b'\n', &mut line)? == 0 {
            return Err(DriverError::ConnectionClosed);
        }
        self.state = DriverState::Idle;
        let text = String::from_utf8_lossy(&line);
        debug!(line = text.trim_end(), "received response");

        if let Some(transcript) = self.transcript.as_mut() {
            transcript.write_all(&line)?;
            if !line.ends_with(b"\n") {
                transcript.write_all(b"\n")?;
            }
        }

        let response =
            Response::parse(&line).map_err(|err| DriverError::protocol(err.to_string()))?;
        match response.body {
            ResponseBody::Result(result) => Ok(result),
            ResponseBody::Error(error) => {
                warn!(id = ?response.id, %error, "server reported an error");
                Err(DriverError::Server {
                    id: response.id,
                    error,
                })
            }
        }
    }

    /// Ask the server to create `object` and wait for the id it assigns.
    pub fn create_object(&mut self, object: &ManagedObject) -> DriverResult<ObjectId> {
        self.send(&Action::CreateObject {
            id: self.config.create_id,
            object: *object,
        })?;

        let result = self.await_result()?;
        let object_id = result.as_u64().ok_or_else(|| {
            DriverError::protocol(format!("create result is not an object id: {result}"))
        })?;
        info!(object_id, "object created");
        Ok(object_id)
    }

    /// Ask the server to delete an object.
    ///
    /// With the default id of 0 this is a notification and no reply is awaited.
    pub fn delete_object(&mut self, object_id: ObjectId) -> DriverResult<()> {
        let id = self.config.delete_id;
        self.send(&Action::DeleteObject { id, object_id })?;
        if id != 0 {
            let result = self.await_result()?;
            debug!(object_id, %result, "delete acknowledged");
        }
        info!(object_id, "object deleted");
        Ok(())
    }

    /// Fetch the server's current description of an object.
    pub fn query_object(&mut self, object_id: ObjectId) -> DriverResult<ManagedObject> {
        self.send(&Action::QueryObject {
            id: self.config.query_id,
            object_id,
        })?;

        let result = self.await_result()?;
        Ok(decode_object(&result)?)
    }

    /// Handshake, then create and delete objects until stopped.
    pub fn run(&mut self) -> DriverResult<StopReason> {
        let reason = match self.drive() {
            Ok(reason) => reason,
            Err(DriverError::Interrupted) => StopReason::Interrupted,
            Err(DriverError::ConnectionClosed) => StopReason::StreamClosed,
            Err(err) => {
                self.state = DriverState::Stopped;
                return Err(err);
            }
        };
        self.state = DriverState::Stopped;
        info!(?reason, cycles = self.cycles, "driver stopped");
        Ok(reason)
    }

    fn drive(&mut self) -> DriverResult<StopReason> {
        self.handshake()?;
        loop {
            if let Some(reason) = self.run_cycle()? {
                return Ok(reason);
            }
        }
    }

    /// One create, cool down, delete round. Returns a reason when the loop should end.
    pub fn run_cycle(&mut self) -> DriverResult<Option<StopReason>> {
        if let Some(limit) = self.config.max_cycles {
            if self.cycles >= limit {
                return Ok(Some(StopReason::CycleLimit));
            }
        }

        self.randomizer.randomize(&mut self.object);
        let object = self.object;
        let object_id = self.create_object(&object)?;

        self.state = DriverState::Cooling;
        if !self.cool_down() {
            return Ok(Some(StopReason::Interrupted));
        }

        self.delete_object(object_id)?;
        self.state = DriverState::Idle;
        self.cycles += 1;
        Ok(None)
    }

    /// Sleep for the configured cooldown in poll-sized slices. False if stopped.
    fn cool_down(&self) -> bool {
        let deadline = Instant::now() + self.config.cooldown;
        loop {
            if self.stop.is_triggered() {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            let remaining = deadline - now;
            let slice = if self.config.poll_interval.is_zero() {
                remaining
            } else {
                remaining.min(self.config.poll_interval)
            };
            thread::sleep(slice);
        }
    }
}
