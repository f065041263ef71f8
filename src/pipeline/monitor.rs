//! Feed monitor: per-frame pipeline and shutdown coordination.
//!
//! # Run Loop
//!
//! 1. Connect the session (failure is returned)
//! 2. Send the subscribe payload (failure closes the session, is returned)
//! 3. Start the read task
//! 4. Process frames one at a time until the feed ends or `stop` resolves;
//!    a frame still in flight when `stop` resolves is abandoned
//! 5. On `stop`: cancel the read task and wait for it up to the grace window
//! 6. Close the session
//!
//! # Per-Frame Pipeline
//!
//! decode → parse → locate (optional, paced) → emit. Decode and parse
//! failures drop the frame; a failed lookup degrades to the unknown location.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::future::Future;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::codec;
use crate::config::MonitorConfig;
use crate::error::Result;
use crate::geocoding::{Geocoder, NominatimClient};
use crate::protocol::{SUBSCRIBE_PAYLOAD, Strike, UNKNOWN_LOCATION};
use crate::transport::Session;

use super::display::{ConsoleEmitter, Emitter};

// ============================================================================
// Monitor
// ============================================================================

/// Runs the strike feed pipeline over one [`Session`].
pub struct Monitor {
    /// Immutable settings.
    config: MonitorConfig,
    /// Feed connection.
    session: Session,
    /// Location lookup, `None` when enrichment is disabled.
    geocoder: Option<Box<dyn Geocoder>>,
    /// Strike output.
    emitter: Box<dyn Emitter>,
}

impl fmt::Debug for Monitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Monitor")
            .field("session", &self.session)
            .field("geocoding", &self.geocoder.is_some())
            .finish_non_exhaustive()
    }
}

impl Monitor {
    /// Creates a monitor with the Nominatim geocoder (if enabled) and the
    /// console emitter.
    ///
    /// # Errors
    ///
    /// - [`crate::Error::Config`] if the configuration is invalid
    /// - [`crate::Error::Http`] if the HTTP client cannot be built
    pub fn new(config: MonitorConfig) -> Result<Self> {
        config.validate()?;

        let geocoder: Option<Box<dyn Geocoder>> = if config.geocoding {
            Some(Box::new(NominatimClient::new(&config)?))
        } else {
            None
        };

        Ok(Self {
            session: Session::new(config.clone()),
            config,
            geocoder,
            emitter: Box::new(ConsoleEmitter),
        })
    }

    /// Replaces the geocoder.
    #[must_use]
    pub fn with_geocoder(mut self, geocoder: impl Geocoder + 'static) -> Self {
        self.geocoder = Some(Box::new(geocoder));
        self
    }

    /// Disables location enrichment.
    #[must_use]
    pub fn without_geocoder(mut self) -> Self {
        self.geocoder = None;
        self
    }

    /// Replaces the emitter.
    #[must_use]
    pub fn with_emitter(mut self, emitter: impl Emitter + 'static) -> Self {
        self.emitter = Box::new(emitter);
        self
    }

    /// Returns the feed session.
    #[inline]
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Runs until the feed ends or `stop` resolves.
    ///
    /// Returns `Ok(())` after a clean remote close or a stop request. The
    /// session is closed on every path, including a failed connect.
    ///
    /// # Errors
    ///
    /// Returns session-fatal errors: connect or subscribe failure, an
    /// unexpected close code, or a transport error.
    pub async fn run<F>(&self, stop: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let result = match self.session.connect().await {
            Ok(()) => self.run_connected(stop).await,
            Err(e) => Err(e),
        };

        self.session.close().await;
        result
    }

    /// Subscribes and drives the frame loop on an open session.
    async fn run_connected<F>(&self, stop: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        self.session.send(SUBSCRIBE_PAYLOAD).await?;
        info!("Subscribed to feed");

        let token = CancellationToken::new();
        let mut frames = self.session.frames(token.clone(), self.config.read_timeout)?;

        self.emitter.started();

        tokio::pin!(stop);

        loop {
            let item = tokio::select! {
                biased;
                () = &mut stop => break,
                item = frames.next() => item,
            };

            match item {
                Some(Ok(frame)) => {
                    // A slow lookup must not hold back a stop request.
                    let processed = tokio::select! {
                        biased;
                        () = &mut stop => break,
                        processed = self.process(&frame) => processed,
                    };

                    if let Err(e) = processed {
                        warn!(error = %e, len = frame.len(), "Dropping message");
                    }
                }
                Some(Err(e)) => {
                    error!(error = %e, "Feed connection failed");
                    return Err(e);
                }
                None => {
                    info!("Connection closed by server");
                    return Ok(());
                }
            }
        }

        info!("Stop requested, shutting down");
        token.cancel();

        let grace = self.config.shutdown_grace;
        if !frames.join(grace).await {
            warn!(
                grace_ms = grace.as_millis() as u64,
                "Timeout waiting for graceful shutdown"
            );
        }

        Ok(())
    }

    /// Decodes, parses, locates and emits one frame.
    ///
    /// Dropping the future before it completes emits nothing.
    ///
    /// # Errors
    ///
    /// Returns the decode or parse error; the frame is not emitted.
    pub async fn process(&self, frame: &[u8]) -> Result<Strike> {
        let payload = codec::decode(frame)?;
        let strike = Strike::from_slice(&payload)?;

        let location = self.locate(&strike).await;
        self.emitter.emit(&strike, &location);

        Ok(strike)
    }

    /// Resolves the location label of a strike.
    ///
    /// Every lookup is followed by the lookup interval, whatever its outcome.
    async fn locate(&self, strike: &Strike) -> String {
        let Some(geocoder) = &self.geocoder else {
            return UNKNOWN_LOCATION.to_string();
        };

        let result = geocoder.lookup(strike.lat, strike.lon).await;
        tokio::time::sleep(self.config.lookup_interval).await;

        match result {
            Ok(address) => address.label().unwrap_or_else(|| {
                debug!(lat = strike.lat, lon = strike.lon, "Address without usable fields");
                UNKNOWN_LOCATION.to_string()
            }),
            Err(e) => {
                warn!(error = %e, lat = strike.lat, lon = strike.lon, "Failed to get location for strike");
                UNKNOWN_LOCATION.to_string()
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;
    use std::time::{Duration, Instant};

    use async_trait::async_trait;
    use parking_lot::Mutex;
    use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;

    use crate::codec::lzw::encode_frame;
    use crate::error::Error;
    use crate::protocol::Address;
    use crate::transport::SessionState;
    use crate::transport::server::FeedServer;

    // ------------------------------------------------------------------------
    // Fixtures
    // ------------------------------------------------------------------------

    #[derive(Clone, Default)]
    struct RecordingEmitter {
        emitted: Arc<Mutex<Vec<(Strike, String)>>>,
        started: Arc<Mutex<bool>>,
    }

    impl Emitter for RecordingEmitter {
        fn started(&self) {
            *self.started.lock() = true;
        }

        fn emit(&self, strike: &Strike, location: &str) {
            self.emitted
                .lock()
                .push((strike.clone(), location.to_string()));
        }
    }

    #[derive(Clone, Default)]
    struct FakeGeocoder {
        calls: Arc<Mutex<Vec<Instant>>>,
        fail: bool,
        delay: Duration,
    }

    #[async_trait]
    impl Geocoder for FakeGeocoder {
        async fn lookup(&self, _lat: f64, _lon: f64) -> Result<Address> {
            self.calls.lock().push(Instant::now());
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if self.fail {
                return Err(Error::geocoding("HTTP status 503 Service Unavailable"));
            }
            Ok(Address {
                town: "Bra".into(),
                country: "Italia".into(),
                ..Default::default()
            })
        }
    }

    fn test_config(url: String) -> MonitorConfig {
        MonitorConfig::new()
            .with_url(url)
            .with_handshake_timeout(Duration::from_secs(2))
            .with_read_timeout(Duration::from_millis(100))
            .with_write_timeout(Duration::from_secs(1))
            .with_lookup_interval(Duration::from_millis(100))
            .with_shutdown_grace(Duration::from_secs(1))
            .without_geocoding()
    }

    fn strike_frame(lat: f64, time: i64) -> Vec<u8> {
        let json = format!(
            r#"{{"time":{time},"lat":{lat},"lon":7.5,"alt":0,"pol":0,"mds":9857,"mcg":210,"status":1,"region":1,"delay":3.2,"latc":4,"lonc":5,"sig":[{{"sta":1,"lat":45.0,"lon":7.0,"alt":230,"status":15,"time":10}}]}}"#
        );
        encode_frame(json.as_bytes())
    }

    // ------------------------------------------------------------------------
    // Pipeline
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_malformed_then_valid() {
        let emitter = RecordingEmitter::default();
        let monitor = Monitor::new(test_config("ws://127.0.0.1:1".into()))
            .expect("monitor")
            .with_emitter(emitter.clone());

        let err = monitor
            .process(&encode_frame(b"{\"lat\":"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Json(_)));
        assert!(emitter.emitted.lock().is_empty());

        let strike = monitor
            .process(&strike_frame(45.25, 1_700_000_000_000_000_000))
            .await
            .expect("valid frame");
        assert_eq!(strike.lat, 45.25);

        let emitted = emitter.emitted.lock();
        assert_eq!(emitted.len(), 1);
        assert_eq!(emitted[0].1, UNKNOWN_LOCATION);
    }

    #[tokio::test]
    async fn test_enrichment_label() {
        let emitter = RecordingEmitter::default();
        let monitor = Monitor::new(test_config("ws://127.0.0.1:1".into()))
            .expect("monitor")
            .with_geocoder(FakeGeocoder::default())
            .with_emitter(emitter.clone());

        monitor.process(&strike_frame(45.0, 1)).await.expect("process");
        assert_eq!(emitter.emitted.lock()[0].1, "Bra, Italia");
    }

    #[tokio::test]
    async fn test_enrichment_failure_uses_sentinel() {
        let emitter = RecordingEmitter::default();
        let geocoder = FakeGeocoder {
            fail: true,
            ..Default::default()
        };
        let monitor = Monitor::new(test_config("ws://127.0.0.1:1".into()))
            .expect("monitor")
            .with_geocoder(geocoder.clone())
            .with_emitter(emitter.clone());

        let frame = strike_frame(46.5, 1_718_000_000_123_456_789);
        let expected = Strike::from_slice(&codec::decode(&frame).expect("decode")).expect("parse");

        monitor.process(&frame).await.expect("process");

        let emitted = emitter.emitted.lock();
        assert_eq!(emitted.len(), 1);
        assert_eq!(emitted[0].0, expected);
        assert_eq!(emitted[0].1, UNKNOWN_LOCATION);
        assert_eq!(geocoder.calls.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_lookup_pacing() {
        let geocoder = FakeGeocoder {
            fail: true,
            ..Default::default()
        };
        let monitor = Monitor::new(test_config("ws://127.0.0.1:1".into()))
            .expect("monitor")
            .with_geocoder(geocoder.clone())
            .with_emitter(RecordingEmitter::default());

        for i in 0..3 {
            monitor.process(&strike_frame(45.0, i)).await.expect("process");
        }

        let calls = geocoder.calls.lock();
        assert_eq!(calls.len(), 3);
        for pair in calls.windows(2) {
            assert!(pair[1].duration_since(pair[0]) >= Duration::from_millis(100));
        }
    }

    // ------------------------------------------------------------------------
    // Run
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_run_until_remote_close() -> anyhow::Result<()> {
        let server = FeedServer::bind().await;
        let url = server.ws_url();
        let frames = vec![
            strike_frame(10.0, 1),
            encode_frame(b"not json at all"),
            strike_frame(20.0, 2),
        ];
        let server_task = server.serve_after_subscribe(frames);

        let emitter = RecordingEmitter::default();
        let monitor = Monitor::new(test_config(url))?.with_emitter(emitter.clone());

        monitor.run(std::future::pending()).await?;

        assert_eq!(server_task.await?.as_deref(), Some(SUBSCRIBE_PAYLOAD));
        assert!(*emitter.started.lock());

        let lats: Vec<f64> = emitter.emitted.lock().iter().map(|(s, _)| s.lat).collect();
        assert_eq!(lats, vec![10.0, 20.0]);
        assert_eq!(monitor.session().state(), SessionState::Closed);
        Ok(())
    }

    #[tokio::test]
    async fn test_run_stop_request() {
        let server = FeedServer::bind().await;
        let url = server.ws_url();
        let server_task = server.serve_silent();

        let monitor = Monitor::new(test_config(url))
            .expect("monitor")
            .with_emitter(RecordingEmitter::default());

        let started = Instant::now();
        let result = monitor
            .run(tokio::time::sleep(Duration::from_millis(200)))
            .await;

        assert!(result.is_ok());
        assert!(started.elapsed() < Duration::from_secs(1));
        assert_eq!(monitor.session().state(), SessionState::Closed);

        server_task.abort();
    }

    #[tokio::test]
    async fn test_stop_during_slow_lookup() {
        let server = FeedServer::bind().await;
        let url = server.ws_url();
        let frame = String::from_utf8(strike_frame(45.0, 1)).expect("text frame");
        let (server_task, _received) = server.serve_recording(vec![frame], None);

        let geocoder = FakeGeocoder {
            delay: Duration::from_secs(4),
            ..Default::default()
        };
        let emitter = RecordingEmitter::default();
        let monitor = Monitor::new(test_config(url).with_shutdown_grace(Duration::from_millis(500)))
            .expect("monitor")
            .with_geocoder(geocoder.clone())
            .with_emitter(emitter.clone());

        let started = Instant::now();
        let result = monitor
            .run(tokio::time::sleep(Duration::from_millis(300)))
            .await;

        assert!(result.is_ok());
        assert!(started.elapsed() < Duration::from_millis(1100));
        assert_eq!(geocoder.calls.lock().len(), 1);
        assert!(emitter.emitted.lock().is_empty());
        assert_eq!(monitor.session().state(), SessionState::Closed);

        server_task.await.expect("server task");
    }

    #[tokio::test]
    async fn test_run_peer_drops_after_upgrade() {
        let server = FeedServer::bind().await;
        let url = server.ws_url();
        let server_task = server.serve_drop();

        let monitor = Monitor::new(test_config(url))
            .expect("monitor")
            .with_emitter(RecordingEmitter::default());

        let result = tokio::time::timeout(Duration::from_secs(3), monitor.run(std::future::pending()))
            .await
            .expect("run must end when the peer is gone");

        let err = result.unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(monitor.session().state(), SessionState::Closed);

        server_task.await.expect("server task");
    }

    #[tokio::test]
    async fn test_run_unexpected_close() {
        let server = FeedServer::bind().await;
        let url = server.ws_url();
        let (server_task, _received) = server.serve_recording(Vec::new(), Some(CloseCode::Policy));

        let monitor = Monitor::new(test_config(url))
            .expect("monitor")
            .with_emitter(RecordingEmitter::default());

        let err = monitor.run(std::future::pending()).await.unwrap_err();
        assert!(matches!(err, Error::UnexpectedClose { code: 1008, .. }));
        assert_eq!(monitor.session().state(), SessionState::Closed);

        server_task.await.expect("server task");
    }

    #[tokio::test]
    async fn test_run_connect_failure() {
        let url = FeedServer::unused_url().await;
        let monitor = Monitor::new(test_config(url))
            .expect("monitor")
            .with_emitter(RecordingEmitter::default());

        let err = monitor.run(std::future::pending()).await.unwrap_err();
        assert!(err.is_connection_error());
        assert_eq!(monitor.session().state(), SessionState::Closed);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = MonitorConfig::new().with_url("http://example.com");
        assert!(matches!(Monitor::new(config), Err(Error::Config { .. })));
    }
}
