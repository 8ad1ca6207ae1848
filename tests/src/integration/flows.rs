//! # Integration Test Flows
//!
//! Drives `DispatchClient` against a simulated execution core over the
//! in-memory channel transport, with the `ResponseListener` routing replies.
//!
//! ## Flows Tested:
//!
//! 1. **Handshake then commands**: commands are only accepted after the connection request succeeds
//! 2. **Out-of-order replies**: the core answers in shuffled batches, every caller gets its own reply
//! 3. **Request errors**: error replies resolve only the failing request
//! 4. **Closing error**: the core closes the connection, all outstanding requests are cancelled
//! 5. **Transport loss**: the core disappears, all outstanding requests are cancelled
//! 6. **Telemetry**: dispatcher metrics show up in the Prometheus text output

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use bytes::Bytes;
    use futures::future::join_all;
    use rand::seq::SliceRandom;
    use tokio::task::JoinHandle;
    use tokio::time::timeout;

    use glide_dispatch::{
        create_channel, CallbackDispatcher, CoreEndpoint, DispatchClient, DispatchConfig,
        DispatchError, ListenerExit, OutboundRequest, RequestErrorKind, RequestKind, Response,
        ResponseListener,
    };
    use glide_telemetry::{gather_metrics, init_telemetry, TelemetryConfig};

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    struct Harness {
        client: Arc<DispatchClient>,
        listener: JoinHandle<ListenerExit>,
    }

    fn connect_harness(config: DispatchConfig) -> (Harness, CoreEndpoint) {
        let dispatcher = Arc::new(CallbackDispatcher::with_config(&config).unwrap());
        let (sender, receiver, core) = create_channel(config.response_channel_capacity);
        let listener = ResponseListener::new(Arc::clone(&dispatcher), Arc::new(receiver)).spawn();
        let client = Arc::new(DispatchClient::new(dispatcher, Arc::new(sender), &config));
        (Harness { client, listener }, core)
    }

    /// Reply for a command body: `GET k` yields `v:k`, `FAIL` yields a request
    /// error, anything else a plain OK.
    fn reply_to(request: &OutboundRequest) -> Response {
        let id = request.callback_id;
        if request.kind == RequestKind::Connection {
            return Response::ok(id);
        }
        match request.body.as_ref() {
            b"FAIL" => Response::request_error(id, RequestErrorKind::ExecAbort, "EXECABORT"),
            body if body.starts_with(b"GET ") => {
                let mut value = b"v:".to_vec();
                value.extend_from_slice(&body[4..]);
                Response::value(id, value)
            }
            _ => Response::ok(id),
        }
    }

    /// Simulated core answering the handshake at once and commands in
    /// shuffled batches of `batch`.
    fn spawn_shuffling_core(mut core: CoreEndpoint, batch: usize) -> JoinHandle<CoreEndpoint> {
        tokio::spawn(async move {
            let mut held: Vec<OutboundRequest> = Vec::with_capacity(batch);
            while let Some(request) = core.next_request().await {
                if request.kind == RequestKind::Connection {
                    if core.respond(reply_to(&request)).await.is_err() {
                        break;
                    }
                    continue;
                }
                held.push(request);
                if held.len() < batch {
                    continue;
                }
                held.shuffle(&mut rand::thread_rng());
                for request in held.drain(..) {
                    if core.respond(reply_to(&request)).await.is_err() {
                        return core;
                    }
                }
            }
            core
        })
    }

    // =============================================================================
    // HANDSHAKE
    // =============================================================================

    #[tokio::test]
    async fn test_commands_wait_for_handshake() {
        let (harness, core) = connect_harness(DispatchConfig::default());
        let _core = spawn_shuffling_core(core, 1);

        assert_eq!(
            harness.client.execute(&b"PING"[..]).await,
            Err(DispatchError::NotConnected)
        );

        harness.client.connect(&b"HELLO"[..]).await.unwrap();
        assert_eq!(harness.client.execute(&b"PING"[..]).await, Ok(None));
    }

    // =============================================================================
    // OUT-OF-ORDER REPLIES
    // =============================================================================

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_shuffled_replies_reach_their_callers() {
        let (harness, core) = connect_harness(DispatchConfig::default());
        let _core = spawn_shuffling_core(core, 16);
        harness.client.connect(&b"HELLO"[..]).await.unwrap();

        let calls = (0..64).map(|i| {
            let client = Arc::clone(&harness.client);
            async move {
                let key = format!("key{}", i);
                let reply = client.execute(format!("GET {}", key)).await;
                (key, reply)
            }
        });

        let results = timeout(Duration::from_secs(10), join_all(calls))
            .await
            .expect("core answered every request");
        for (key, reply) in results {
            assert_eq!(reply, Ok(Some(Bytes::from(format!("v:{}", key)))));
        }

        let dispatcher = harness.client.dispatcher();
        assert_eq!(dispatcher.pending_count(), 0);
        // Handshake + 64 commands, never more than 65 outstanding at once.
        assert!(dispatcher.issued_ids() <= 65);
        assert_eq!(dispatcher.stats().completed, 65);
    }

    #[tokio::test]
    async fn test_request_error_only_fails_its_request() {
        let (harness, core) = connect_harness(DispatchConfig::default());
        let _core = spawn_shuffling_core(core, 2);
        harness.client.connect(&b"HELLO"[..]).await.unwrap();

        let client = Arc::clone(&harness.client);
        let (failed, fine) = tokio::join!(
            client.execute(&b"FAIL"[..]),
            harness.client.execute(&b"GET a"[..]),
        );

        assert_eq!(
            failed,
            Err(DispatchError::Request {
                kind: RequestErrorKind::ExecAbort,
                message: "EXECABORT".into(),
            })
        );
        assert_eq!(fine, Ok(Some(Bytes::from_static(b"v:a"))));
        assert!(harness.client.is_connected());
    }

    // =============================================================================
    // CONNECTION LOSS
    // =============================================================================

    #[tokio::test]
    async fn test_closing_error_cancels_outstanding_requests() {
        let (harness, mut core) = connect_harness(DispatchConfig::default());

        let server = tokio::spawn(async move {
            let hello = core.next_request().await.unwrap();
            core.respond(Response::ok(hello.callback_id)).await.unwrap();

            let first = core.next_request().await.unwrap();
            let _second = core.next_request().await.unwrap();
            core.respond(Response::closing_error(first.callback_id, "server shutting down"))
                .await
                .unwrap();
            core
        });

        harness.client.connect(&b"HELLO"[..]).await.unwrap();
        let client = Arc::clone(&harness.client);
        let (a, b) = tokio::join!(
            client.execute(&b"BLPOP q 0"[..]),
            harness.client.execute(&b"BLPOP r 0"[..]),
        );

        let outcomes = [a, b];
        assert!(outcomes
            .iter()
            .any(|o| *o == Err(DispatchError::Closing("server shutting down".into()))));
        assert!(outcomes
            .iter()
            .any(|o| *o == Err(DispatchError::ConnectionClosed)));

        assert_eq!(
            harness.listener.await.unwrap(),
            ListenerExit::ClosingError("server shutting down".into())
        );
        assert!(harness.client.dispatcher().is_closed());
        assert_eq!(
            harness.client.execute(&b"PING"[..]).await,
            Err(DispatchError::ConnectionClosed)
        );
        drop(server);
    }

    #[tokio::test]
    async fn test_core_disappearing_cancels_outstanding_requests() {
        let (harness, mut core) = connect_harness(DispatchConfig::default());

        let server = tokio::spawn(async move {
            let hello = core.next_request().await.unwrap();
            core.respond(Response::ok(hello.callback_id)).await.unwrap();
            for _ in 0..3 {
                core.next_request().await.unwrap();
            }
            // Dropping the endpoint closes both directions.
        });

        harness.client.connect(&b"HELLO"[..]).await.unwrap();
        let calls = (0..3).map(|_| {
            let client = Arc::clone(&harness.client);
            async move { client.execute(&b"BLPOP q 0"[..]).await }
        });
        let results = join_all(calls).await;
        server.await.unwrap();

        for result in results {
            assert_eq!(result, Err(DispatchError::ConnectionClosed));
        }
        assert_eq!(harness.listener.await.unwrap(), ListenerExit::TransportClosed);

        let stats = harness.client.dispatcher().stats();
        assert_eq!(stats.cancelled, 3);
        // Every id issued is back in the pool.
        let dispatcher = harness.client.dispatcher();
        assert_eq!(dispatcher.recycled_ids() as u64, dispatcher.issued_ids());
    }

    // =============================================================================
    // TELEMETRY
    // =============================================================================

    #[tokio::test]
    async fn test_dispatch_metrics_exported() {
        let config = TelemetryConfig {
            console_output: false,
            ..Default::default()
        };
        let _guard = init_telemetry(config).unwrap();

        let (harness, core) = connect_harness(DispatchConfig::default());
        let _core = spawn_shuffling_core(core, 1);
        harness.client.connect(&b"HELLO"[..]).await.unwrap();
        harness.client.execute(&b"GET m"[..]).await.unwrap();
        harness.client.dispatcher().on_response(
            glide_dispatch::CallbackId::from_wire(u32::MAX),
            glide_dispatch::ResponseOutcome::Ok,
        );

        let text = gather_metrics().unwrap();
        for name in [
            "glide_dispatch_callbacks_registered_total",
            "glide_dispatch_callbacks_completed_total",
            "glide_dispatch_unmatched_responses_total",
            "glide_dispatch_callbacks_pending",
        ] {
            assert!(text.contains(name), "missing metric {}", name);
        }
    }
}
