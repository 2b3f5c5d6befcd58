use crate::core::client::AthemeClient;
use crate::core::{CommandRequest, MethodCall, Result, Transport, Value};
use serde::Serialize;
use std::fmt::Display;
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Strings verbatim, everything else in its display form.
    #[default]
    Text,
    Json,
}

/// Runs one call and prints the reply. Nothing is written unless the call
/// succeeds.
pub struct Invoker<T: Transport> {
    client: AthemeClient<T>,
    format: OutputFormat,
}

impl<T: Transport> Invoker<T> {
    pub fn new(client: AthemeClient<T>) -> Self {
        Self {
            client,
            format: OutputFormat::Text,
        }
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    pub fn client(&self) -> &AthemeClient<T> {
        &self.client
    }

    pub async fn run<W: Write>(&self, request: &MethodCall, out: &mut W) -> Result<Value> {
        let value = self.client.call(request).await?;
        self.emit(&value, out)?;
        Ok(value)
    }

    pub async fn run_command<W: Write>(&self, request: &CommandRequest, out: &mut W) -> Result<Value> {
        let value = self.client.command(request).await?;
        self.emit(&value, out)?;
        Ok(value)
    }

    pub fn emit<D, W>(&self, item: &D, out: &mut W) -> Result<()>
    where
        D: Display + Serialize + ?Sized,
        W: Write,
    {
        match self.format {
            OutputFormat::Text => writeln!(out, "{}", item)?,
            OutputFormat::Json => writeln!(out, "{}", serde_json::to_string(item)?)?,
        }
        out.flush()?;
        Ok(())
    }
}
