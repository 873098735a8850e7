// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `config.rs`

#[cfg(test)]
mod tests {
    use crate::config::{Cli, OperatorConfig};
    use clap::Parser;
    use std::time::Duration;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["jenkins-operator"]).unwrap();
        let config = OperatorConfig::from(&cli);

        assert_eq!(config.watch_namespace, None);
        assert_eq!(config.concurrency, 4);
        assert_eq!(config.reconcile_timeout, Duration::from_secs(60));
        assert_eq!(cli.metrics_addr.port(), 8383);
        assert_eq!(cli.lease_name, "jenkins-operator-lock");
        assert_eq!(cli.default_log_filter(), "info");
    }

    #[test]
    fn test_namespace_scoped_watch() {
        let cli = Cli::try_parse_from(["jenkins-operator", "--namespace", "demo"]).unwrap();
        assert_eq!(
            OperatorConfig::from(&cli).watch_namespace.as_deref(),
            Some("demo")
        );
    }

    #[test]
    fn test_flags() {
        let cli = Cli::try_parse_from([
            "jenkins-operator",
            "--concurrency",
            "8",
            "--reconcile-timeout",
            "15",
            "--leader-election",
            "--debug",
        ])
        .unwrap();
        let config = OperatorConfig::from(&cli);

        assert!(cli.leader_election);
        assert_eq!(cli.default_log_filter(), "debug");
        assert_eq!(config.concurrency, 8);
        assert_eq!(config.reconcile_timeout, Duration::from_secs(15));
    }

    #[test]
    fn test_zero_timeout_is_clamped() {
        let cli =
            Cli::try_parse_from(["jenkins-operator", "--reconcile-timeout", "0"]).unwrap();
        assert_eq!(
            OperatorConfig::from(&cli).reconcile_timeout,
            Duration::from_secs(1)
        );
    }
}
