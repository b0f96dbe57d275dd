#[macro_use]
extern crate tracing;

use std::process::exit;
use std::thread::sleep;
use std::time::Duration;

use clap::{ArgAction, Args, Parser, Subcommand};
use serde::Serialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use u2f_host_rs::{
    AuthenticateRequest, ChannelIdPublicKey, Error, JSONWebKey, RegisterRequest, USBDeviceToken,
    USBTransport,
};

/// How long to wait between retries while the key waits for a touch.
const POLL_INTERVAL: Duration = Duration::from_millis(250);
/// Give up waiting for a touch after this many polls (25 seconds).
const MAX_POLLS: u32 = 100;

/// Parses a JSON Web Key object, for use as a `clap` `value_parser`.
fn parse_jwk(i: &str) -> Result<JSONWebKey, String> {
    serde_json::from_str(i).map_err(|e| e.to_string())
}

#[derive(Debug, Args)]
struct ChannelIdOpt {
    /// JSON Web Key to bind into clientData, as a JSON object
    /// (eg: '{"kty":"EC","crv":"P-256","x":"...","y":"..."}').
    #[clap(long, value_parser = parse_jwk, value_name = "JWK")]
    jwk: Option<JSONWebKey>,

    /// Pre-serialized channel id public key to bind into clientData.
    #[clap(long, value_name = "STRING")]
    jwk_string: Option<String>,

    /// Record in clientData that channel id binding is unsupported.
    #[clap(long, action = ArgAction::SetTrue)]
    channel_id_unused: bool,
}

impl ChannelIdOpt {
    fn build(self) -> Option<ChannelIdPublicKey> {
        match ChannelIdPublicKey::from_options(self.jwk, self.jwk_string, self.channel_id_unused) {
            Ok(cid) => cid,
            Err(e) => {
                error!("{}", e);
                exit(1);
            }
        }
    }
}

#[derive(Debug, Args)]
struct RegisterOpt {
    /// The registration challenge.
    #[clap(short, long)]
    challenge: String,

    /// Application id to register against.
    #[clap(short, long)]
    app_id: String,

    /// The origin requesting the registration.
    #[clap(short, long)]
    facet: String,

    #[clap(flatten)]
    channel_id: ChannelIdOpt,
}

#[derive(Debug, Args)]
struct AuthenticateOpt {
    /// The challenge to sign.
    #[clap(short, long)]
    challenge: String,

    /// Application id the key handle was registered against.
    #[clap(short, long)]
    app_id: String,

    /// The origin requesting the assertion.
    #[clap(short, long)]
    facet: String,

    /// Base64url key handle returned at registration.
    #[clap(short, long)]
    key_handle: String,

    /// Only check whether the key handle belongs to a connected key,
    /// without signing.
    #[clap(long, action = ArgAction::SetTrue)]
    check_only: bool,

    #[clap(flatten)]
    channel_id: ChannelIdOpt,
}

#[derive(Debug, Subcommand)]
enum Opt {
    /// Register a connected U2F key against an application id.
    Register(RegisterOpt),
    /// Sign a challenge with a previously registered key handle.
    Authenticate(AuthenticateOpt),
    /// Show the protocol version of each connected key.
    Version,
}

#[derive(Debug, Parser)]
#[clap(about = "CLI for FIDO U2F security keys")]
struct CliParser {
    #[clap(subcommand)]
    commands: Opt,

    /// Turn on verbose logging.
    #[clap(short, long, global = true, action = ArgAction::SetTrue)]
    verbose: bool,
}

fn main() {
    let opt = CliParser::parse();
    let default_level = if opt.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(default_level.into())
                .from_env_lossy(),
        )
        .compact()
        .init();

    match opt.commands {
        Opt::Register(o) => {
            let req = RegisterRequest {
                challenge: o.challenge,
                app_id: o.app_id,
                facet: o.facet,
                channel_id_public_key: o.channel_id.build(),
            };
            eprintln!("Touch the U2F key you wish to register...");
            let resp = poll_tokens(|token| token.register(&req));
            print_json(&resp);
        }
        Opt::Authenticate(o) => {
            let req = AuthenticateRequest {
                challenge: o.challenge,
                app_id: o.app_id,
                facet: o.facet,
                key_handle: o.key_handle,
                check_only: o.check_only,
                channel_id_public_key: o.channel_id.build(),
            };
            if req.check_only {
                check_key_handle(&req);
            } else {
                let resp = poll_tokens(|token| token.authenticate(&req));
                print_json(&resp);
            }
        }
        Opt::Version => {
            for mut token in open_tokens() {
                match token.version() {
                    Ok(version) => println!("{}", version),
                    Err(e) => error!("version request failed: {}", e),
                }
                token.close();
            }
        }
    }
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string(value) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            error!("could not serialize response: {}", e);
            exit(1);
        }
    }
}

/// Opens a session with every connected key, skipping ones that fail.
/// Exits when no key could be opened at all.
fn open_tokens() -> Vec<USBDeviceToken> {
    let transport = match USBTransport::new() {
        Ok(t) => t,
        Err(e) => {
            error!("could not initialize USB HID: {}", e);
            exit(1);
        }
    };
    let tokens = match transport.tokens() {
        Ok(t) => t,
        Err(e) => {
            error!("could not enumerate devices: {}", e);
            exit(1);
        }
    };

    let mut open = Vec::new();
    for mut token in tokens {
        match token.open() {
            Ok(()) => {
                match token.version() {
                    Ok(version) => debug!("device version: {}", version),
                    Err(e) => debug!("device version error: {}", e),
                }
                open.push(token);
            }
            Err(e) => debug!("skipping device that failed to open: {}", e),
        }
    }
    if open.is_empty() {
        error!("failed to find any devices");
        exit(1);
    }
    open
}

/// Retries `operation` on every open key until one succeeds, prompting for
/// a touch the first time a key asks for user presence.
fn poll_tokens<T>(mut operation: impl FnMut(&mut USBDeviceToken) -> Result<T, Error>) -> T {
    let mut tokens = open_tokens();
    let mut prompted = false;
    let mut result = None;

    'poll: for _ in 0..MAX_POLLS {
        for token in tokens.iter_mut() {
            match operation(token) {
                Ok(resp) => {
                    result = Some(resp);
                    break 'poll;
                }
                Err(Error::TestOfUserPresenceRequired) => {
                    if !prompted {
                        eprintln!("\nTouch the flashing U2F key...\n");
                        prompted = true;
                    }
                }
                Err(e) => debug!("got error from device, skipping: {}", e),
            }
        }
        sleep(POLL_INTERVAL);
    }

    for token in tokens.iter_mut() {
        token.close();
    }
    match result {
        Some(resp) => resp,
        None => {
            error!("no response after {} seconds", MAX_POLLS * 250 / 1000);
            exit(1);
        }
    }
}

/// Asks each key whether it issued the key handle. The key answers a
/// check-only request with a status error either way: "touch required"
/// means the handle is valid, "bad key handle" means it is not.
fn check_key_handle(req: &AuthenticateRequest) {
    for (i, mut token) in open_tokens().into_iter().enumerate() {
        match token.authenticate(req) {
            Err(Error::TestOfUserPresenceRequired) => {
                println!("device {}: key handle is valid for this key", i);
            }
            Err(Error::BadKeyHandle) => {
                println!("device {}: key handle is not valid for this key", i);
            }
            Ok(_) => warn!("device {}: unexpected success for a check-only request", i),
            Err(e) => error!("device {}: {}", i, e),
        }
        token.close();
    }
}
