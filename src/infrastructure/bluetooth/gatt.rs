//! GATT Application Module
//!
//! Turns the motor attribute table into a `bluer` GATT application and
//! forwards reads, writes and notification sessions to the control system.

use crate::domain::encoding::{self, EncodingError};
use crate::domain::models::{AttributeBinding, CharacteristicBinding, ReadSource};
use crate::domain::motor::MotorLayout;
use crate::domain::notify::{NotifyState, Tick};
use crate::domain::protocol;
use crate::infrastructure::epics::{ProcessVariableClient, PvError};
use async_trait::async_trait;
use bluer::gatt::local::{
    Application, Characteristic, CharacteristicNotifier, CharacteristicNotify,
    CharacteristicNotifyMethod, CharacteristicRead, CharacteristicWrite,
    CharacteristicWriteMethod, Descriptor, DescriptorRead, DescriptorWrite, ReqError,
    ReqResult, Service,
};
use futures::FutureExt;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use thiserror::Error;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

pub type SharedClient = Arc<dyn ProcessVariableClient>;

#[derive(Debug, Error)]
pub enum ReadError {
    #[error(transparent)]
    Pv(#[from] PvError),
    #[error("{name}: {source}")]
    Encoding {
        name: String,
        #[source]
        source: EncodingError,
    },
}

/// Fetch and encode the current value of `source`
pub async fn read_value(
    client: &dyn ProcessVariableClient,
    source: &ReadSource,
) -> Result<Vec<u8>, ReadError> {
    let text = match source {
        ReadSource::ProcessVariable { name, format } => {
            let raw = client.get(name).await?;
            format.render(&raw).map_err(|source| ReadError::Encoding {
                name: name.clone(),
                source,
            })?
        }
        ReadSource::Literal(text) => text.clone(),
    };
    Ok(encoding::encode_text(&text))
}

/// Read request handler. Failures are logged and reported as a failed request.
pub async fn handle_read(
    client: &dyn ProcessVariableClient,
    source: &ReadSource,
) -> ReqResult<Vec<u8>> {
    read_value(client, source).await.map_err(|e| {
        error!("Read failed: {}", e);
        ReqError::Failed
    })
}

/// Write request handler. Errors from the control system are logged only;
/// the client always sees the write succeed.
pub async fn handle_write(
    client: &dyn ProcessVariableClient,
    pv: &str,
    value: Vec<u8>,
) -> ReqResult<()> {
    let text = encoding::decode_text(&value);
    if text.is_empty() {
        warn!("Ignoring empty write to {}", pv);
        return Ok(());
    }

    info!("Writing {:?} to {}", text, pv);
    if let Err(e) = client.put(pv, &text).await {
        error!("Write to {} failed: {}", pv, e);
    }
    Ok(())
}

/// Receiving end of a notification session
#[async_trait]
pub trait NotifySink: Send {
    async fn notify(&mut self, value: Vec<u8>) -> io::Result<()>;
    /// Resolves once the client unsubscribed
    async fn stopped(&mut self);
    fn is_stopped(&self) -> bool;
}

#[async_trait]
impl NotifySink for CharacteristicNotifier {
    async fn notify(&mut self, value: Vec<u8>) -> io::Result<()> {
        CharacteristicNotifier::notify(self, value)
            .await
            .map_err(io::Error::other)
    }

    async fn stopped(&mut self) {
        CharacteristicNotifier::stopped(self).await
    }

    fn is_stopped(&self) -> bool {
        CharacteristicNotifier::is_stopped(self)
    }
}

fn lock(state: &Mutex<NotifyState>) -> MutexGuard<'_, NotifyState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Poll `source` every `interval` and push changed values to `sink` until the
/// client unsubscribes.
///
/// The first tick fires immediately, so a subscriber gets the current value
/// right away. A session started while another is running takes over, and the
/// older loop exits at its next tick.
pub async fn run_notify_session<S: NotifySink>(
    client: SharedClient,
    source: ReadSource,
    state: Arc<Mutex<NotifyState>>,
    interval: Duration,
    mut sink: S,
) {
    let session = lock(&state).start();
    info!("Notification session {} started", session);

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = sink.stopped() => break,
            _ = ticker.tick() => {}
        }
        if sink.is_stopped() || !lock(&state).is_current(session) {
            break;
        }

        let read = tokio::select! {
            _ = sink.stopped() => break,
            read = read_value(client.as_ref(), &source) => read,
        };
        let value = match read {
            Ok(value) => value,
            Err(e) => {
                warn!("Notification poll failed: {}", e);
                if !lock(&state).is_current(session) {
                    break;
                }
                continue;
            }
        };

        let tick = lock(&state).observe(session, value);
        match tick {
            Tick::Notify(value) => {
                debug!("Notifying {:?}", String::from_utf8_lossy(&value));
                if let Err(e) = sink.notify(value).await {
                    warn!("Notification failed: {}", e);
                    break;
                }
            }
            Tick::Unchanged => {}
            Tick::Stop => break,
        }
    }

    lock(&state).stop_session(session);
    info!("Notification session {} stopped", session);
}

fn characteristic_read(client: &SharedClient, source: &ReadSource) -> CharacteristicRead {
    let client = client.clone();
    let source = source.clone();
    CharacteristicRead {
        read: true,
        fun: Box::new(move |_req| {
            let client = client.clone();
            let source = source.clone();
            async move { handle_read(client.as_ref(), &source).await }.boxed()
        }),
        ..Default::default()
    }
}

fn characteristic_write(client: &SharedClient, pv: &str) -> CharacteristicWrite {
    let client = client.clone();
    let pv = pv.to_string();
    CharacteristicWrite {
        write: true,
        method: CharacteristicWriteMethod::Fun(Box::new(move |value, _req| {
            let client = client.clone();
            let pv = pv.clone();
            async move { handle_write(client.as_ref(), &pv, value).await }.boxed()
        })),
        ..Default::default()
    }
}

fn characteristic_notify(
    client: &SharedClient,
    source: &ReadSource,
    interval: Duration,
) -> CharacteristicNotify {
    let client = client.clone();
    let source = source.clone();
    let state = Arc::new(Mutex::new(NotifyState::new()));
    CharacteristicNotify {
        notify: true,
        method: CharacteristicNotifyMethod::Fun(Box::new(move |notifier| {
            let client = client.clone();
            let source = source.clone();
            let state = state.clone();
            async move {
                tokio::spawn(run_notify_session(client, source, state, interval, notifier));
            }
            .boxed()
        })),
        ..Default::default()
    }
}

fn build_descriptor(binding: &AttributeBinding, client: &SharedClient) -> Descriptor {
    let read = binding.read.as_ref().map(|source| {
        let client = client.clone();
        let source = source.clone();
        DescriptorRead {
            read: true,
            fun: Box::new(move |_req| {
                let client = client.clone();
                let source = source.clone();
                async move { handle_read(client.as_ref(), &source).await }.boxed()
            }),
            ..Default::default()
        }
    });

    let write = binding.write.as_ref().map(|pv| {
        let client = client.clone();
        let pv = pv.clone();
        DescriptorWrite {
            write: true,
            fun: Box::new(move |value, _req| {
                let client = client.clone();
                let pv = pv.clone();
                async move { handle_write(client.as_ref(), &pv, value).await }.boxed()
            }),
            ..Default::default()
        }
    });

    Descriptor {
        uuid: binding.uuid,
        read,
        write,
        ..Default::default()
    }
}

fn build_characteristic(
    binding: &CharacteristicBinding,
    client: &SharedClient,
    interval: Duration,
) -> Characteristic {
    let attribute = &binding.attribute;
    debug!(
        "{:?} characteristic {} with {} descriptor(s)",
        attribute.kind,
        attribute.uuid,
        binding.descriptors.len()
    );
    let notify = match (&attribute.read, attribute.notify) {
        (Some(source), true) => Some(characteristic_notify(client, source, interval)),
        _ => None,
    };

    Characteristic {
        uuid: attribute.uuid,
        read: attribute
            .read
            .as_ref()
            .map(|source| characteristic_read(client, source)),
        write: attribute
            .write
            .as_ref()
            .map(|pv| characteristic_write(client, pv)),
        notify,
        descriptors: binding
            .descriptors
            .iter()
            .map(|d| build_descriptor(d, client))
            .collect(),
        ..Default::default()
    }
}

/// Build the motor service holding every configured motor's characteristics
pub fn build_application(
    layouts: &[MotorLayout],
    client: SharedClient,
    notify_interval: Duration,
) -> Application {
    let characteristics = layouts
        .iter()
        .flat_map(|layout| layout.characteristics.iter())
        .map(|binding| build_characteristic(binding, &client, notify_interval))
        .collect();

    Application {
        services: vec![Service {
            uuid: protocol::SERVICE_UUID,
            primary: true,
            characteristics,
            ..Default::default()
        }],
        ..Default::default()
    }
}
