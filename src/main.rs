// MIT License - Copyright (c) 2026 Peter Wright
// MQTT bridge

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS, Transport};
use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal::unix::{signal, SignalKind};
use tokio::time::interval;
use tracing::{debug, error, info, warn};

use keypad_alarm::bridge::homeassistant::{self, ControlMessage, Topics};
use keypad_alarm::bridge::{shadow, status_changed};
use keypad_alarm::keypad;
use keypad_alarm::{
    Alarm, AlarmConfig, AlarmHandle, AlarmHooks, AlarmService, AlarmSnapshot, CountdownPolicy,
};

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

#[derive(Parser)]
#[command(name = "alarm2mqtt")]
#[command(about = "Keypad door alarm with a Home Assistant MQTT bridge")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, default_value = "config.toml")]
    config: String,
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct Config {
    alarm: AlarmToml,
    mqtt: MqttToml,
    /// IoT shadow sync; disabled when the section is absent
    #[serde(default)]
    shadow: Option<ShadowToml>,
}

#[derive(Debug, Deserialize)]
struct AlarmToml {
    code: String,
    #[serde(default = "default_countdown_ticks")]
    countdown_ticks: u32,
    /// Entry countdown length; defaults to `countdown_ticks`
    #[serde(default)]
    triggering_ticks: Option<u32>,
    #[serde(default = "default_tick_interval")]
    tick_interval_ms: u64,
    #[serde(default = "default_display_clear")]
    display_clear_ms: u64,
}

fn default_countdown_ticks() -> u32 {
    10
}
fn default_tick_interval() -> u64 {
    1000
}
fn default_display_clear() -> u64 {
    5000
}

#[derive(Debug, Deserialize)]
struct MqttToml {
    url: String,
    #[serde(default = "default_client_id")]
    client_id: String,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    password: Option<String>,
    #[serde(default = "default_keep_alive")]
    keep_alive_secs: u64,
    #[serde(default = "default_republish_interval")]
    republish_interval_secs: u64,
    /// CA bundle (PEM); enables TLS
    #[serde(default)]
    ca_file: Option<String>,
    #[serde(default)]
    client_cert_file: Option<String>,
    #[serde(default)]
    client_key_file: Option<String>,
    #[serde(default = "default_control_topic")]
    control_topic: String,
    #[serde(default = "default_alarm_state_topic")]
    alarm_state_topic: String,
    #[serde(default = "default_door_state_topic")]
    door_state_topic: String,
    #[serde(default = "default_alarm_availability_topic")]
    alarm_availability_topic: String,
    #[serde(default = "default_door_availability_topic")]
    door_availability_topic: String,
}

fn default_client_id() -> String {
    "keypad-alarm".to_string()
}
fn default_keep_alive() -> u64 {
    30
}
fn default_republish_interval() -> u64 {
    600
}
fn default_control_topic() -> String {
    Topics::default().control
}
fn default_alarm_state_topic() -> String {
    Topics::default().alarm_state
}
fn default_door_state_topic() -> String {
    Topics::default().door_state
}
fn default_alarm_availability_topic() -> String {
    Topics::default().alarm_availability
}
fn default_door_availability_topic() -> String {
    Topics::default().door_availability
}

#[derive(Debug, Deserialize)]
struct ShadowToml {
    thing_name: String,
}

fn build_alarm_config(toml: &AlarmToml) -> Result<AlarmConfig> {
    let tick = Duration::from_millis(toml.tick_interval_ms);
    let config = AlarmConfig::builder()
        .code(&toml.code)
        .arming(CountdownPolicy::new(toml.countdown_ticks, tick))
        .triggering(CountdownPolicy::new(
            toml.triggering_ticks.unwrap_or(toml.countdown_ticks),
            tick,
        ))
        .display_clear_delay(Duration::from_millis(toml.display_clear_ms))
        .build();
    config.validate()?;
    Ok(config)
}

fn build_topics(toml: &MqttToml) -> Topics {
    Topics {
        control: toml.control_topic.clone(),
        alarm_state: toml.alarm_state_topic.clone(),
        door_state: toml.door_state_topic.clone(),
        alarm_availability: toml.alarm_availability_topic.clone(),
        door_availability: toml.door_availability_topic.clone(),
    }
}

fn build_mqtt_options(toml: &MqttToml) -> Result<MqttOptions> {
    let (host, port) = parse_mqtt_url(&toml.url)?;
    let mut opts = MqttOptions::new(&toml.client_id, host, port);
    opts.set_keep_alive(Duration::from_secs(toml.keep_alive_secs));
    if let Some(username) = &toml.username {
        opts.set_credentials(username, toml.password.as_deref().unwrap_or_default());
    }
    if let Some(ca_file) = &toml.ca_file {
        let ca = std::fs::read(ca_file).with_context(|| format!("Failed to read {ca_file}"))?;
        let client_auth = match (&toml.client_cert_file, &toml.client_key_file) {
            (Some(cert), Some(key)) => Some((
                std::fs::read(cert).with_context(|| format!("Failed to read {cert}"))?,
                std::fs::read(key).with_context(|| format!("Failed to read {key}"))?,
            )),
            (None, None) => None,
            _ => anyhow::bail!("client_cert_file and client_key_file must be set together"),
        };
        opts.set_transport(Transport::tls(ca, client_auth, None));
    }
    Ok(opts)
}

// ---------------------------------------------------------------------------
// Hardware stand-ins
// ---------------------------------------------------------------------------

/// Logs what the buzzer would do.
struct ConsoleHooks;

impl AlarmHooks for ConsoleHooks {
    fn low_beep(&mut self) {
        debug!("beep (low)");
    }

    fn medium_beep(&mut self) {
        debug!("beep (medium)");
    }

    fn high_beep(&mut self) {
        debug!("beep (high)");
    }

    fn start_sound(&mut self) {
        warn!("Siren on");
    }

    fn stop_sound(&mut self) {
        debug!("Siren off");
    }
}

/// Feed stdin lines to the alarm: `open` / `close` for the door, anything
/// else as key presses.
async fn run_console_input(handle: AlarmHandle) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => {
                info!("Console input closed");
                return;
            }
            Err(e) => {
                error!("Failed to read console input: {e}");
                return;
            }
        };
        let result = match line.trim() {
            "open" => handle.set_door_is_open(true).await.map(|_| ()),
            "close" | "closed" => handle.set_door_is_open(false).await.map(|_| ()),
            keys => {
                let mut result = Ok(());
                for key in keys.chars().filter(|c| !c.is_whitespace()) {
                    debug!("Key pressed: {key}");
                    if let Err(e) = handle.key_pressed(key.to_ascii_uppercase()).await {
                        result = Err(e);
                        break;
                    }
                }
                result
            }
        };
        match result {
            Ok(()) => {}
            Err(e) if e.is_shutdown() => {
                debug!("Alarm stopped, closing console input");
                return;
            }
            Err(e) => warn!("Console input rejected: {e}"),
        }
    }
}

/// Log the four characters a display would show whenever they change.
async fn run_display(handle: AlarmHandle) {
    let mut updates = handle.subscribe();
    let mut displaying = String::new();
    loop {
        let shown = keypad::visible(&updates.borrow_and_update().display).to_string();
        if shown != displaying {
            info!("Display: [{shown:>4}]");
            displaying = shown;
        }
        if updates.changed().await.is_err() {
            break;
        }
    }
}

// ---------------------------------------------------------------------------
// MQTT publishing
// ---------------------------------------------------------------------------

async fn publish(client: &AsyncClient, topic: &str, qos: QoS, retain: bool, payload: String) {
    if let Err(e) = client.publish(topic, qos, retain, payload).await {
        error!("Failed to publish to {topic}: {e}");
    }
}

async fn publish_available(client: &AsyncClient, topics: &Topics) {
    for topic in [&topics.alarm_availability, &topics.door_availability] {
        publish(client, topic, QoS::AtLeastOnce, false, homeassistant::ONLINE.to_string()).await;
    }
}

async fn publish_alarm(client: &AsyncClient, topics: &Topics, snapshot: &AlarmSnapshot) {
    let payload = homeassistant::alarm_payload(snapshot.state);
    info!("Setting alarm value in MQTT: {payload}");
    publish(client, &topics.alarm_state, QoS::AtLeastOnce, true, payload.to_string()).await;
}

async fn publish_door(client: &AsyncClient, topics: &Topics, snapshot: &AlarmSnapshot) {
    let payload = homeassistant::door_payload(snapshot.door_is_open);
    info!("Setting door value in MQTT: {payload}");
    publish(client, &topics.door_state, QoS::AtMostOnce, true, payload.to_string()).await;
}

async fn publish_shadow(client: &AsyncClient, thing_name: &str, snapshot: &AlarmSnapshot) {
    let doc = shadow::ShadowDocument::reported(snapshot.into());
    match doc.to_json() {
        Ok(json) => {
            publish(client, &shadow::update_topic(thing_name), QoS::AtMostOnce, false, json).await
        }
        Err(e) => error!("Failed to serialize shadow update: {e}"),
    }
}

async fn publish_all(
    client: &AsyncClient,
    topics: &Topics,
    thing_name: Option<&str>,
    snapshot: &AlarmSnapshot,
) {
    publish_available(client, topics).await;
    publish_alarm(client, topics, snapshot).await;
    publish_door(client, topics, snapshot).await;
    if let Some(thing) = thing_name {
        publish_shadow(client, thing, snapshot).await;
    }
}

/// Publish whenever the alarm state or the door changes.
async fn run_state_publisher(
    handle: AlarmHandle,
    client: AsyncClient,
    topics: Topics,
    thing_name: Option<String>,
) {
    let mut updates = handle.subscribe();
    let mut last = updates.borrow_and_update().clone();
    publish_all(&client, &topics, thing_name.as_deref(), &last).await;

    while updates.changed().await.is_ok() {
        let current = updates.borrow_and_update().clone();
        if !status_changed(&last, &current) {
            continue;
        }
        publish_available(&client, &topics).await;
        if current.state != last.state {
            publish_alarm(&client, &topics, &current).await;
        }
        if current.door_is_open != last.door_is_open {
            publish_door(&client, &topics, &current).await;
        }
        if let Some(thing) = thing_name.as_deref() {
            publish_shadow(&client, thing, &current).await;
        }
        last = current;
    }
}

// ---------------------------------------------------------------------------
// MQTT command handler
// ---------------------------------------------------------------------------

async fn handle_control(payload: &[u8], handle: &AlarmHandle) {
    let msg = match ControlMessage::parse(payload) {
        Ok(msg) => msg,
        Err(e) => {
            warn!("Failed to parse control message: {e}");
            return;
        }
    };
    let request = match msg.authorize(&handle.snapshot().code) {
        Ok(request) => request,
        Err(e) => {
            warn!("{e}");
            return;
        }
    };
    match handle.apply(request).await {
        Ok(snapshot) => info!("Control {}: alarm now {}", msg.action, snapshot.state),
        Err(e) => error!("Control {} failed: {e}", msg.action),
    }
}

async fn handle_shadow(payload: &[u8], handle: &AlarmHandle) {
    match shadow::desired_request(payload) {
        Ok(Some(request)) => match handle.apply(request).await {
            Ok(snapshot) => info!("Shadow requested {request}: alarm now {}", snapshot.state),
            Err(e) => error!("Shadow request {request} failed: {e}"),
        },
        Ok(None) => {}
        Err(e) => warn!("Failed to decode shadow update: {e}"),
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    // RUST_LOG controls verbosity (e.g. RUST_LOG=debug or RUST_LOG=keypad_alarm=debug).
    // Default: info.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    // systemd journal already adds timestamps, so omit them when running under systemd
    if std::env::var_os("JOURNAL_STREAM").is_some() {
        tracing_subscriber::fmt().without_time().with_env_filter(env_filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let cli = Cli::parse();

    // Load config
    let config_text =
        std::fs::read_to_string(&cli.config).context("Failed to read config file")?;
    let config: Config = toml::from_str(&config_text).context("Failed to parse config file")?;

    let alarm_config = build_alarm_config(&config.alarm).context("Invalid alarm config")?;
    let topics = build_topics(&config.mqtt);
    let mqtt_opts = build_mqtt_options(&config.mqtt)?;
    let thing_name = config.shadow.map(|s| s.thing_name);
    let republish_every = Duration::from_secs(config.mqtt.republish_interval_secs.max(1));

    info!(
        "Creating alarm (exit countdown {:?}, entry countdown {:?})...",
        alarm_config.arming.total(),
        alarm_config.triggering.total()
    );
    let queue = alarm_config.command_queue;
    let (alarm, timer_events) = Alarm::new(alarm_config, ConsoleHooks);
    let handle = AlarmService::spawn(alarm, timer_events, queue);

    let mut sigterm = signal(SignalKind::terminate())?;

    // Set up MQTT
    let (client, mut eventloop) = AsyncClient::new(mqtt_opts, 64);

    // Task 1: MQTT event loop (receives messages, handles commands)
    let handle_cmds = handle.clone();
    let client_cmds = client.clone();
    let control_topic = topics.control.clone();
    let shadow_topic = thing_name.as_deref().map(shadow::accepted_topic);
    let mqtt_handle = tokio::spawn(async move {
        loop {
            match eventloop.poll().await {
                Ok(Event::Incoming(Packet::ConnAck(_))) => {
                    // rumqttc does not resubscribe after a reconnect
                    info!("MQTT: connected, subscribing to {control_topic}");
                    if let Err(e) = client_cmds.subscribe(&control_topic, QoS::AtLeastOnce).await
                    {
                        error!("Failed to subscribe to {control_topic}: {e}");
                    }
                    if let Some(topic) = &shadow_topic
                        && let Err(e) = client_cmds.subscribe(topic, QoS::AtMostOnce).await
                    {
                        error!("Failed to subscribe to {topic}: {e}");
                    }
                }
                Ok(Event::Incoming(Packet::Publish(msg))) => {
                    debug!(
                        "Received message: {} on topic: {}",
                        String::from_utf8_lossy(&msg.payload),
                        msg.topic
                    );
                    if msg.topic == control_topic {
                        handle_control(&msg.payload, &handle_cmds).await;
                    } else if shadow_topic.as_deref() == Some(msg.topic.as_str()) {
                        handle_shadow(&msg.payload, &handle_cmds).await;
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    error!("MQTT event loop error: {e}");
                    tokio::time::sleep(Duration::from_secs(1)).await;
                }
            }
        }
    });

    // Task 2: publish state changes
    let publisher_handle = tokio::spawn(run_state_publisher(
        handle.clone(),
        client.clone(),
        topics.clone(),
        thing_name.clone(),
    ));

    // Task 3: periodic republish so retained state survives broker restarts
    let handle_snap = handle.clone();
    let client_snap = client.clone();
    let topics_snap = topics.clone();
    let thing_snap = thing_name.clone();
    let republish_handle = tokio::spawn(async move {
        let mut ticker = interval(republish_every);
        // Skip the first immediate tick (the publisher already sent the initial state)
        ticker.tick().await;
        loop {
            ticker.tick().await;
            debug!("Ticker: publishing current state");
            let snapshot = handle_snap.snapshot();
            publish_all(&client_snap, &topics_snap, thing_snap.as_deref(), &snapshot).await;
        }
    });

    // Task 4: keypad and door from the console
    let input_handle = tokio::spawn(run_console_input(handle.clone()));

    // Task 5: display
    let display_handle = tokio::spawn(run_display(handle.clone()));

    info!("Alarm running. Type keys (e.g. A1234#) or open/close, SIGINT/SIGTERM to stop.");
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received SIGINT, shutting down...");
        }
        _ = sigterm.recv() => {
            info!("Received SIGTERM, shutting down...");
        }
    }

    // Abort tasks
    mqtt_handle.abort();
    publisher_handle.abort();
    republish_handle.abort();
    input_handle.abort();
    display_handle.abort();

    if let Err(e) = client.disconnect().await {
        debug!("MQTT disconnect: {e}");
    }

    info!("Shutdown complete");
    Ok(())
}

/// Parse an MQTT URL like "mqtt://host:port" into (host, port).
fn parse_mqtt_url(url: &str) -> Result<(String, u16)> {
    let stripped = url
        .strip_prefix("mqtt://")
        .or_else(|| url.strip_prefix("mqtts://"))
        .or_else(|| url.strip_prefix("tcp://"))
        .or_else(|| url.strip_prefix("tls://"))
        .unwrap_or(url);

    let (host, port_str) = stripped
        .rsplit_once(':')
        .context("MQTT URL must be in format mqtt://host:port")?;

    let port: u16 = port_str.parse().context("Invalid MQTT port number")?;

    Ok((host.to_string(), port))
}
