// Tests d'intégration : résolution complète des requêtes, adaptateur console et service UDP.

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;
    use std::sync::Arc;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tokio::time::Duration;
    use routing_simulation::client::ProtocolClient;
    use routing_simulation::console::Console;
    use routing_simulation::error::{AppError, RouteError};
    use routing_simulation::hop_source::{RandomHops, ScriptedHops};
    use routing_simulation::init::{init_state, service_hop_limit};
    use routing_simulation::net_utils::{send_message, MAX_DATAGRAM};
    use routing_simulation::path_builder::{self, PathBuilder};
    use routing_simulation::protocol::message_types::{HistoryEntry, Request, Response};
    use routing_simulation::read_config::{NetworkConfig, RouterEntry};
    use routing_simulation::resolver::{CacheStatus, Lookup, Resolution, RouteResolver};
    use routing_simulation::route_cache::MAX_ROUTE_HISTORY;
    use routing_simulation::server::response_handler::{expire_sessions, handle_request};
    use routing_simulation::server::ProtocolServer;
    use routing_simulation::topology::AdjacencyTopology;
    use routing_simulation::types::{Endpoint, Path, RouteKey, RouterId};
    use routing_simulation::AppState;

    fn r(id: u16) -> RouterId {
        RouterId(id)
    }

    fn path(ids: &[u16]) -> Path {
        Path::from_routers(ids.iter().map(|id| RouterId(*id)).collect()).unwrap()
    }

    fn reference_config() -> NetworkConfig {
        let routers = (1..=4)
            .map(|i| RouterEntry {
                networks: vec![format!("10.0.0.{}", i), format!("192.168.{}.1", i)],
            })
            .collect();
        NetworkConfig {
            routers,
            ..NetworkConfig::reference()
        }
    }

    fn reference_resolver() -> RouteResolver {
        reference_config().build_resolver().unwrap()
    }

    fn client_addr() -> SocketAddr {
        "127.0.0.1:40000".parse().unwrap()
    }

    fn assert_valid_path(topology: &AdjacencyTopology, p: &Path, source: RouterId, destination: RouterId) {
        assert_eq!(p.source(), source);
        assert_eq!(p.destination(), destination);
        for pair in p.routers().windows(2) {
            assert_eq!(topology.is_adjacent(pair[0], pair[1]), Ok(true), "{} is not a legal path", p);
        }
    }

    // --- Scénarios du résolveur ---

    #[test]
    fn test_direct_route_then_history_hit() {
        let mut resolver = reference_resolver();

        let first = resolver
            .resolve("10.0.0.1", "10.0.0.4", &mut ScriptedHops::direct())
            .unwrap();

        assert_eq!(first.source_router, r(1));
        assert_eq!(first.destination_router, r(4));
        assert_eq!(first.path, path(&[1, 4]));
        assert_eq!(first.cache, CacheStatus::Stored);

        // Aucune décision disponible : un appel au constructeur de chemin abandonnerait
        let mut no_decisions = ScriptedHops::new(None, []);
        let second = resolver.resolve("10.0.0.1", "10.0.0.4", &mut no_decisions).unwrap();

        assert_eq!(second.path, path(&[1, 4]));
        assert_eq!(second.cache, CacheStatus::Hit);
        assert_eq!(resolver.cache().len(), 1);
    }

    #[test]
    fn test_manual_route_through_intermediate() {
        let mut resolver = reference_resolver();
        let mut hops = ScriptedHops::new(None, [2, 0]);

        let resolution = resolver.resolve("10.0.0.1", "10.0.0.3", &mut hops).unwrap();

        assert_eq!(resolution.path, path(&[1, 2, 3]));
        assert_eq!(resolution.cache, CacheStatus::Stored);
        assert_eq!(hops.advisories(), &[r(2)]);
        assert!(hops.rejections().is_empty());
    }

    #[test]
    fn test_self_loop_rejected_in_manual_session() {
        let mut resolver = reference_resolver();
        let mut hops = ScriptedHops::new(None, [2, 2, 0]);

        let resolution = resolver.resolve("10.0.0.1", "10.0.0.3", &mut hops).unwrap();

        assert_eq!(hops.rejections(), &[RouteError::SelfLoopRejected(r(2))]);
        assert_eq!(resolution.path, path(&[1, 2, 3]));
    }

    #[test]
    fn test_reverse_query_is_a_separate_route() {
        let mut resolver = reference_resolver();
        resolver
            .resolve("10.0.0.1", "10.0.0.3", &mut ScriptedHops::new(None, [2, 0]))
            .unwrap();

        let reverse = resolver
            .resolve("10.0.0.3", "10.0.0.1", &mut ScriptedHops::new(None, [4, 0]))
            .unwrap();

        assert_eq!(reverse.cache, CacheStatus::Stored);
        assert_eq!(reverse.path, path(&[3, 4, 1]));
        assert_eq!(resolver.cache().len(), 2);
    }

    #[test]
    fn test_same_router_query_bypasses_history() {
        let mut resolver = reference_resolver();

        let resolution = resolver
            .resolve("10.0.0.2", "192.168.2.1", &mut ScriptedHops::new(None, []))
            .unwrap();

        assert_eq!(resolution.path, path(&[2]));
        assert_eq!(resolution.cache, CacheStatus::Bypassed);
        assert!(resolver.cache().is_empty());
    }

    #[test]
    fn test_address_errors() {
        let mut resolver = reference_resolver();
        let mut hops = ScriptedHops::direct();

        assert_eq!(
            resolver.resolve("10.0.0", "10.0.0.4", &mut hops),
            Err(RouteError::InvalidAddressFormat("10.0.0".to_string()))
        );
        assert_eq!(
            resolver.resolve("10.0.0.1", "300.0.0.4", &mut hops),
            Err(RouteError::InvalidAddressFormat("300.0.0.4".to_string()))
        );
        assert_eq!(
            resolver.resolve("10.9.9.9", "10.0.0.4", &mut hops),
            Err(RouteError::AddressNotFound(Endpoint::Source))
        );
        assert_eq!(
            resolver.resolve("10.0.0.1", "10.9.9.9", &mut hops),
            Err(RouteError::AddressNotFound(Endpoint::Destination))
        );
        assert!(resolver.cache().is_empty());
    }

    #[test]
    fn test_abandoned_session_is_not_cached() {
        let mut resolver = reference_resolver();
        let mut hops = ScriptedHops::new(None, [2]);

        let result = resolver.resolve("10.0.0.1", "10.0.0.3", &mut hops);

        assert_eq!(result, Err(RouteError::SessionAbandoned));
        assert!(resolver.cache().is_empty());
    }

    #[test]
    fn test_history_full_still_returns_path() {
        let routers = vec![
            RouterEntry {
                networks: (1..=4).map(|i| format!("10.1.0.{}", i)).collect(),
            },
            RouterEntry {
                networks: (1..=4).map(|i| format!("10.2.0.{}", i)).collect(),
            },
            RouterEntry::default(),
            RouterEntry::default(),
        ];
        let config = NetworkConfig {
            routers,
            ..NetworkConfig::reference()
        };
        let mut resolver = config.build_resolver().unwrap();

        let mut pairs = Vec::new();
        for i in 1..=4 {
            for j in 1..=4 {
                pairs.push((format!("10.1.0.{}", i), format!("10.2.0.{}", j)));
                pairs.push((format!("10.2.0.{}", j), format!("10.1.0.{}", i)));
            }
        }

        for (source, destination) in pairs.iter().take(MAX_ROUTE_HISTORY) {
            let resolution = resolver
                .resolve(source, destination, &mut ScriptedHops::direct())
                .unwrap();
            assert_eq!(resolution.cache, CacheStatus::Stored);
        }

        let (source, destination) = &pairs[MAX_ROUTE_HISTORY];
        let overflow = resolver
            .resolve(source, destination, &mut ScriptedHops::direct())
            .unwrap();

        assert_eq!(overflow.cache, CacheStatus::Full);
        assert_eq!(overflow.path.routers().len(), 2);
        assert_eq!(resolver.cache().len(), MAX_ROUTE_HISTORY);

        // Toujours pas enregistrée : la même requête repasse par le constructeur
        let again = resolver
            .resolve(source, destination, &mut ScriptedHops::direct())
            .unwrap();
        assert_eq!(again.cache, CacheStatus::Full);
    }

    #[test]
    fn test_commit_after_concurrent_insert_keeps_first_path() {
        let mut resolver = reference_resolver();

        let mut first = match resolver.begin("10.0.0.1", "10.0.0.3").unwrap() {
            Lookup::Pending(pending) => pending,
            Lookup::Resolved(_) => panic!("expected a pending route"),
        };
        let mut second = match resolver.begin("10.0.0.1", "10.0.0.3").unwrap() {
            Lookup::Pending(pending) => pending,
            Lookup::Resolved(_) => panic!("expected a pending route"),
        };

        path_builder::drive(&mut first.builder, &mut ScriptedHops::new(None, [2, 0])).unwrap();
        path_builder::drive(&mut second.builder, &mut ScriptedHops::new(None, [4, 0])).unwrap();

        let winner = resolver.commit(first).unwrap();
        let loser = resolver.commit(second).unwrap();

        assert_eq!(winner.cache, CacheStatus::Stored);
        assert_eq!(loser.cache, CacheStatus::AlreadyCached);
        assert_eq!(loser.path, path(&[1, 4, 3]));
        assert_eq!(resolver.cache().lookup(&winner.key), Some(&path(&[1, 2, 3])));
    }

    #[test]
    fn test_commit_requires_finalized_session() {
        let mut resolver = reference_resolver();
        let pending = match resolver.begin("10.0.0.1", "10.0.0.3").unwrap() {
            Lookup::Pending(pending) => pending,
            Lookup::Resolved(_) => panic!("expected a pending route"),
        };

        let result = resolver.commit(pending);

        assert!(matches!(result, Err(RouteError::InvalidTransition { .. })));
        assert!(resolver.cache().is_empty());
    }

    #[test]
    fn test_random_sessions_only_finalize_on_legal_paths() {
        let topology = Arc::new(AdjacencyTopology::reference());
        let mut hops = RandomHops::new(StdRng::seed_from_u64(7), topology.router_count());
        let mut finalized = 0;

        for source in topology.routers() {
            for destination in topology.routers() {
                for _ in 0..25 {
                    let mut builder = PathBuilder::new(Arc::clone(&topology), source, destination)
                        .unwrap()
                        .with_iteration_cap(40);
                    match path_builder::drive(&mut builder, &mut hops) {
                        Ok(p) => {
                            assert_valid_path(&topology, &p, source, destination);
                            finalized += 1;
                        }
                        Err(err) => assert_eq!(err, RouteError::IterationLimitReached(40)),
                    }
                }
            }
        }

        assert!(finalized > 0);
    }

    // --- Adaptateur console ---

    fn run_console(input: &str, resolver: &mut RouteResolver) -> String {
        let mut console = Console::new(input.as_bytes(), Vec::new());
        console.run(resolver, None);
        String::from_utf8(console.into_output()).unwrap()
    }

    #[test]
    fn test_console_direct_route_then_history() {
        let mut resolver = reference_resolver();

        let output = run_console(
            "10.0.0.1\n10.0.0.4\n1\n0\n10.0.0.1\n10.0.0.4\n1\n",
            &mut resolver,
        );

        assert!(output.contains("Source router is 1"));
        assert!(output.contains("Destination router is 4"));
        assert!(output.contains("Direct link found between R1 and R4."));
        assert!(output.contains("--- DIRECT ROUTE SELECTED ---"));
        assert!(output.contains("--- NEW ROUTE LOGGED ---"));
        assert!(output.contains("--- HISTORY FOUND ---"));
        assert!(output.contains("Intermediate Routers details (Concatenated IDs): 14"));
        assert!(output.contains("--- Simulation Ended ---"));
    }

    #[test]
    fn test_console_manual_route_with_bad_inputs() {
        let mut resolver = reference_resolver();

        let output = run_console(
            "1.2.3\n10.9.9.9\n10.0.0.1\n10.0.0.3\nabc\n2\n0\n1\n",
            &mut resolver,
        );

        assert!(output.contains("Invalid IP format. Please re-enter."));
        assert!(output.contains("Error: Source IP not found in any router's network list. Please re-enter."));
        assert!(output.contains("--- MANUAL ROUTE DEFINITION ---"));
        assert!(output.contains("Invalid router ID. Must be between 1 and 4."));
        assert!(output.contains("R2 is now directly connected to Destination R3."));
        assert!(output.contains("Intermediate Routers Path (IDs): 123"));
        assert!(output.contains("Path established: R1 --> R2 --> R3"));
        assert_eq!(resolver.cache().len(), 1);
    }

    #[test]
    fn test_console_reports_missing_link() {
        let mut resolver = reference_resolver();

        let output = run_console("10.0.0.1\n10.0.0.3\n2\n4\n0\n1\n", &mut resolver);

        assert!(output.contains("Invalid path: Router R2 has no direct link to Router R4."));
        assert!(output.contains("Path established: R1 --> R2 --> R3"));
    }

    #[test]
    fn test_console_route_already_logged_by_another_session() {
        let mut console = Console::new(&b""[..], Vec::new());
        let resolution = Resolution {
            key: RouteKey::new("10.0.0.1", "10.0.0.3"),
            source_router: r(1),
            destination_router: r(3),
            path: path(&[1, 4, 3]),
            cache: CacheStatus::AlreadyCached,
        };

        console.print_resolution(&resolution);
        let output = String::from_utf8(console.into_output()).unwrap();

        assert!(output.contains("--- ROUTE ALREADY LOGGED ---"));
        assert!(!output.contains("--- NEW ROUTE LOGGED ---"));
        assert!(output.contains("Path established: R1 --> R4 --> R3"));
    }

    #[test]
    fn test_console_reads_router_networks() {
        let input = "5\n1\n0\n1\n2\nbad\n10.0.0.1\n10.0.0.1\n10.0.0.3\n10.0.0.4\n10.0.0.5\n";
        let mut console = Console::new(input.as_bytes(), Vec::new());

        let entries = console.read_router_networks(4, 4).unwrap();

        assert_eq!(entries[0].networks, vec!["10.0.0.1".to_string()]);
        assert!(entries[1].networks.is_empty());
        assert_eq!(entries[2].networks, vec!["10.0.0.3".to_string()]);
        assert_eq!(entries[3].networks, vec!["10.0.0.4".to_string(), "10.0.0.5".to_string()]);
        let output = String::from_utf8(console.into_output()).unwrap();
        assert!(output.contains("Address 10.0.0.1 is already assigned to router 1."));
        assert!(output.contains("Total networks defined: 4"));
    }

    // --- Service ---

    fn service_state(timeout: Duration) -> Arc<AppState> {
        let config = NetworkConfig {
            session_timeout_secs: timeout.as_secs(),
            ..reference_config()
        };
        init_state(&config).unwrap()
    }

    #[tokio::test]
    async fn test_service_manual_session_flow() {
        let state = service_state(Duration::from_secs(60));
        let client = client_addr();

        let opened = handle_request(
            &state,
            Request::Query {
                source: "10.0.0.1".to_string(),
                destination: "10.0.0.3".to_string(),
            },
            client,
        )
        .await;
        let session = match opened {
            Response::AwaitingHop { session, current, ref path_so_far, destination_reachable, .. } => {
                assert_eq!(current, r(1));
                assert_eq!(path_so_far, &vec![r(1)]);
                assert!(!destination_reachable);
                session
            }
            other => panic!("unexpected response: {:?}", other),
        };

        let rejected = handle_request(&state, Request::ProposeHop { session, hop: 0 }, client).await;
        assert!(matches!(rejected, Response::Rejected { ref code, .. } if code == "CannotFinalizeYet"));

        let advanced = handle_request(&state, Request::ProposeHop { session, hop: 2 }, client).await;
        assert!(matches!(advanced, Response::AwaitingHop { destination_reachable: true, .. }));

        let done = handle_request(&state, Request::ProposeHop { session, hop: 0 }, client).await;
        match done {
            Response::Resolved { resolution, legacy } => {
                assert_eq!(resolution.path, path(&[1, 2, 3]));
                assert_eq!(resolution.cache, CacheStatus::Stored);
                assert_eq!(legacy, "123");
            }
            other => panic!("unexpected response: {:?}", other),
        }
        assert_eq!(state.session_count().await, 0);

        let history = handle_request(&state, Request::History, client).await;
        assert!(matches!(history, Response::History { ref entries, capacity: 20 } if entries.len() == 1));
    }

    #[tokio::test]
    async fn test_service_direct_offer_and_foreign_client() {
        let state = service_state(Duration::from_secs(60));
        let client = client_addr();
        let intruder: SocketAddr = "127.0.0.1:40001".parse().unwrap();

        let offered = handle_request(
            &state,
            Request::Query {
                source: "10.0.0.1".to_string(),
                destination: "10.0.0.4".to_string(),
            },
            client,
        )
        .await;
        let session = match offered {
            Response::OfferDirect { session, source_router, destination_router } => {
                assert_eq!((source_router, destination_router), (r(1), r(4)));
                session
            }
            other => panic!("unexpected response: {:?}", other),
        };

        let hijack = handle_request(&state, Request::ChooseDirect { session }, intruder).await;
        assert!(matches!(hijack, Response::Rejected { ref code, .. } if code == "UnknownSession"));

        let hop_too_early = handle_request(&state, Request::ProposeHop { session, hop: 4 }, client).await;
        assert!(matches!(hop_too_early, Response::Rejected { ref code, .. } if code == "InvalidTransition"));

        let done = handle_request(&state, Request::ChooseDirect { session }, client).await;
        assert!(matches!(done, Response::Resolved { ref resolution, .. } if resolution.path == path(&[1, 4])));

        let cached = handle_request(
            &state,
            Request::Query {
                source: "10.0.0.1".to_string(),
                destination: "10.0.0.4".to_string(),
            },
            intruder,
        )
        .await;
        assert!(matches!(cached, Response::Resolved { ref resolution, .. } if resolution.cache == CacheStatus::Hit));
    }

    #[tokio::test]
    async fn test_service_abandon_and_expiry_discard_sessions() {
        let state = service_state(Duration::ZERO);
        let client = client_addr();
        let query = Request::Query {
            source: "10.0.0.1".to_string(),
            destination: "10.0.0.3".to_string(),
        };

        let first = handle_request(&state, query.clone(), client).await;
        let session = match first {
            Response::AwaitingHop { session, .. } => session,
            other => panic!("unexpected response: {:?}", other),
        };
        let abandoned = handle_request(&state, Request::Abandon { session }, client).await;
        assert!(matches!(abandoned, Response::Abandoned { .. }));

        handle_request(&state, query, client).await;
        assert_eq!(state.session_count().await, 1);
        tokio::time::sleep(Duration::from_millis(5)).await;

        assert_eq!(expire_sessions(&state).await, 1);
        assert_eq!(state.session_count().await, 0);
        assert!(state.resolver.lock().await.cache().is_empty());
    }

    #[tokio::test]
    async fn test_service_rejects_unknown_addresses() {
        let state = service_state(Duration::from_secs(60));

        let response = handle_request(
            &state,
            Request::Query {
                source: "10.0.0.1".to_string(),
                destination: "10.7.7.7".to_string(),
            },
            client_addr(),
        )
        .await;

        match response {
            Response::Rejected { session, code, .. } => {
                assert_eq!(session, None);
                assert_eq!(code, "AddressNotFound");
            }
            other => panic!("unexpected response: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_udp_round_trip() {
        let state = service_state(Duration::from_secs(60));
        let server = ProtocolServer::bind("127.0.0.1:0", state).await.unwrap();
        let addr = server.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = server.run().await;
        });

        let client = ProtocolClient::new(addr).await.unwrap();

        let topology = client.send(&Request::Topology).await.unwrap();
        assert!(matches!(topology, Response::Topology { ref matrix, .. } if matrix.len() == 4));

        let offered = client
            .send(&Request::Query {
                source: "192.168.1.1".to_string(),
                destination: "192.168.2.1".to_string(),
            })
            .await
            .unwrap();
        let session = match offered {
            Response::OfferDirect { session, .. } => session,
            other => panic!("unexpected response: {:?}", other),
        };

        let done = client.send(&Request::ChooseDirect { session }).await.unwrap();
        assert!(matches!(done, Response::Resolved { ref resolution, .. } if resolution.path == path(&[1, 2])));
    }

    #[tokio::test]
    async fn test_service_clamps_configured_hop_cap() {
        let config = NetworkConfig {
            max_manual_hops: Some(1_000_000),
            ..reference_config()
        };
        let state = init_state(&config).unwrap();
        let client = client_addr();
        let limit = service_hop_limit(config.max_route_history);

        let opened = handle_request(
            &state,
            Request::Query {
                source: "10.0.0.1".to_string(),
                destination: "10.0.0.3".to_string(),
            },
            client,
        )
        .await;
        let session = match opened {
            Response::AwaitingHop { session, .. } => session,
            other => panic!("unexpected response: {:?}", other),
        };

        for i in 0..limit {
            let hop = if i % 2 == 0 { 2 } else { 1 };
            let reply = handle_request(&state, Request::ProposeHop { session, hop }, client).await;
            assert!(matches!(reply, Response::AwaitingHop { .. }), "hop {} got {:?}", i, reply);
        }
        let last = handle_request(&state, Request::ProposeHop { session, hop: 2 }, client).await;

        assert!(matches!(last, Response::Abandoned { .. }));
        assert_eq!(state.session_count().await, 0);
        assert!(state.resolver.lock().await.cache().is_empty());
    }

    #[test]
    fn test_full_history_of_longest_paths_fits_in_one_datagram() {
        let capacity = MAX_ROUTE_HISTORY;
        // sauts acceptés, plus la source et la destination
        let longest = path(&vec![u16::MAX; service_hop_limit(capacity) + 2]);
        let entries = (0..capacity)
            .map(|_| HistoryEntry {
                key: RouteKey::new("255.255.255.255", "255.255.255.255"),
                path: longest.clone(),
                legacy: longest.legacy_digits(),
            })
            .collect();

        let reply = serde_json::to_vec(&Response::History { entries, capacity }).unwrap();

        assert!(reply.len() <= MAX_DATAGRAM, "{} bytes", reply.len());
    }

    #[tokio::test]
    async fn test_oversized_message_is_not_sent() {
        let socket = tokio::net::UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let target = socket.local_addr().unwrap();
        let message = Response::Error {
            message: "x".repeat(MAX_DATAGRAM),
        };

        let sent = send_message(&socket, &target, &message, "[TEST]").await;

        assert!(matches!(sent, Err(AppError::NetworkError(_))));
    }

    #[tokio::test]
    async fn test_udp_long_session_stops_at_hop_limit() {
        let state = service_state(Duration::from_secs(60));
        let server = ProtocolServer::bind("127.0.0.1:0", state).await.unwrap();
        let addr = server.local_addr().unwrap();
        let state = Arc::clone(server.state());
        tokio::spawn(async move {
            let _ = server.run().await;
        });

        let client = ProtocolClient::new(addr)
            .await
            .unwrap()
            .with_reply_timeout(Duration::from_secs(2));
        let opened = client
            .send(&Request::Query {
                source: "10.0.0.1".to_string(),
                destination: "10.0.0.3".to_string(),
            })
            .await
            .unwrap();
        let session = match opened {
            Response::AwaitingHop { session, .. } => session,
            other => panic!("unexpected response: {:?}", other),
        };

        let limit = service_hop_limit(MAX_ROUTE_HISTORY);
        for i in 0..limit {
            let hop = if i % 2 == 0 { 2 } else { 1 };
            match client.send(&Request::ProposeHop { session, hop }).await.unwrap() {
                Response::AwaitingHop { path_so_far, .. } => assert_eq!(path_so_far.len(), i + 2),
                other => panic!("hop {} got {:?}", i, other),
            }
        }
        let last = client.send(&Request::ProposeHop { session, hop: 2 }).await.unwrap();

        assert!(matches!(last, Response::Abandoned { .. }));
        assert_eq!(state.session_count().await, 0);
    }
}
