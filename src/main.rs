//! Main application entry point (CLI binary).
//!
//! A thin wrapper around the `http_request` library that handles:
//! - Command-line argument parsing
//! - Logger initialization
//! - User-facing output formatting
//!
//! All request handling is implemented in the library crate.

use std::collections::BTreeMap;
use std::process;

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::warn;
use serde::Serialize;

use http_request::config::{OutputFormat, Opt, CONTENT_TYPE, MULTIPART_FORM_DATA};
use http_request::fetch::parse_header_line;
use http_request::initialization::init_logger_with;
use http_request::{FormData, HttpRequest, ProxyRef};

/// What the binary prints for `--output json`.
#[derive(Debug, Serialize)]
struct ResponseSummary {
    status: Option<u16>,
    url: Option<String>,
    redirects: Vec<String>,
    cookies: BTreeMap<String, String>,
    encoding: Option<String>,
    body_bytes: usize,
    body: Option<String>,
}

fn main() {
    let opt = Opt::parse();

    if let Err(e) = init_logger_with(opt.log_level.clone().into(), opt.log_format.clone())
        .context("Failed to initialize logger")
    {
        eprintln!("http_request error: {:#}", e);
        process::exit(1);
    }

    if let Err(e) = run(&opt) {
        eprintln!("http_request error: {:#}", e);
        process::exit(1);
    }
}

fn run(opt: &Opt) -> Result<()> {
    let mut request = match &opt.proxy {
        Some(address) => HttpRequest::with_proxy(
            opt.url.as_str(),
            ProxyRef::parse(opt.proxy_type, address).context("Invalid --proxy")?,
        ),
        None => HttpRequest::new(opt.url.as_str()),
    };

    let mut headers = Vec::with_capacity(opt.headers.len() + 1);
    for line in &opt.headers {
        match parse_header_line(line) {
            Some(header) => headers.push(header),
            None => bail!("Invalid --header {:?}, expected `Name: value`", line),
        }
    }
    if opt.multipart {
        headers.push((CONTENT_TYPE.to_string(), MULTIPART_FORM_DATA.to_string()));
    }

    let data = parse_form_fields(&opt.data)?;

    request
        .timeout(opt.timeout())
        .follow_redirects(!opt.no_redirects)
        .max_redirects(opt.max_redirects)
        .headers(headers)
        .execute(opt.method, data)
        .with_context(|| format!("{} {} failed", opt.method, opt.url))?;

    if request.is_bad_status() {
        warn!(
            "{} answered with status {}",
            opt.url,
            request.status().unwrap_or_default()
        );
    }

    match opt.output {
        OutputFormat::Plain => print_plain(&mut request),
        OutputFormat::Json => print_json(&mut request),
    }
}

fn parse_form_fields(fields: &[String]) -> Result<Option<FormData>> {
    if fields.is_empty() {
        return Ok(None);
    }
    let mut data = FormData::new();
    for field in fields {
        let Some((name, value)) = field.split_once('=') else {
            bail!("Invalid --data {:?}, expected `name=value`", field);
        };
        data.push(name, value);
    }
    Ok(Some(data))
}

fn print_plain(request: &mut HttpRequest) -> Result<()> {
    println!("Status: {}", request.status().unwrap_or_default());
    for (hop, url) in request.redirects().iter().enumerate() {
        println!("  {} {}", hop + 1, url);
    }
    if let Some(jar) = request.cookies() {
        for (name, value) in jar.snapshot() {
            println!("Cookie: {}={}", name, value);
        }
    }
    if request.has_text_body()? {
        println!();
        println!("{}", request.body()?);
    } else if !request.is_body_empty()? {
        println!("<{} bytes of binary content>", request.body_bytes()?.len());
    }
    Ok(())
}

fn print_json(request: &mut HttpRequest) -> Result<()> {
    let encoding = request.encoding()?.map(|charset| charset.name().to_string());
    let body_bytes = request.body_bytes()?.len();
    let body = request
        .has_text_body()?
        .then(|| request.body().map(str::to_string))
        .transpose()?;
    let summary = ResponseSummary {
        status: request.status(),
        url: request.url().map(|url| url.to_string()),
        redirects: request.redirects().iter().map(|url| url.to_string()).collect(),
        cookies: request.cookies().map(|jar| jar.snapshot()).unwrap_or_default(),
        encoding,
        body_bytes,
        body,
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&summary).context("Failed to serialize response")?
    );
    Ok(())
}
