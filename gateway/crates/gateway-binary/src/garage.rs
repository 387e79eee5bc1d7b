use std::{fs, path::PathBuf};

use anyhow::{anyhow, Context};
use async_graphql_parser::types::OperationType;
use car_services::{garage_schema, Seed, Store};
use engine::{Request, Response, Schema, Variables};
use futures_util::StreamExt;
use gateway_config::Config;
use runtime::pubsub::EventBroker;
use runtime_local::NativeFetcher;
use tokio::{sync::mpsc, task::JoinSet};

/// The served schema along with the broker its subscriptions listen on.
pub(crate) struct Garage {
    pub schema: Schema,
    broker: EventBroker,
}

impl Garage {
    pub fn build(config: &Config) -> anyhow::Result<Self> {
        let seed = match &config.store.seed_path {
            Some(path) => {
                let seed = fs::read_to_string(path).map_err(|e| anyhow!("error loading seed file:\n{e}"))?;
                Seed::from_json(&seed)?
            }
            None => Seed::reference(),
        };
        let store = Store::from_seed(seed)?;
        tracing::debug!(?store, "store loaded");

        let fetcher = config.data_source.as_ref().map(|data_source| {
            let fetcher = NativeFetcher::runtime_fetcher(data_source.url.clone());
            match data_source.timeout {
                Some(timeout) => fetcher.with_timeout(timeout),
                None => fetcher,
            }
        });

        let broker = EventBroker::new();
        let schema = garage_schema(store, broker.clone(), fetcher, config.schema.dealership)?;

        Ok(Self { schema, broker })
    }

    /// Runs `operations` in order, sending every response to `output`.
    ///
    /// Subscriptions start listening when their turn comes and keep forwarding events while
    /// the following operations run. Once the last operation is done every listener is closed
    /// and pending events are drained.
    pub async fn run(&self, operations: Vec<Request>, output: mpsc::UnboundedSender<Response>) -> anyhow::Result<()> {
        let mut subscriptions = JoinSet::new();

        for request in operations {
            if is_subscription(&request.query) {
                let mut events = self.schema.execute_stream(request);
                let output = output.clone();

                subscriptions.spawn(async move {
                    while let Some(response) = events.next().await {
                        if output.send(response).is_err() {
                            break;
                        }
                    }
                });
                continue;
            }

            let response = self.schema.execute(request).await;
            if response.is_err() {
                tracing::warn!(errors = response.errors.len(), "operation returned errors");
            }
            output.send(response).context("response output closed")?;
        }

        self.broker.close_all();
        while let Some(result) = subscriptions.join_next().await {
            result?;
        }

        Ok(())
    }
}

pub(crate) fn read_operations(files: &[PathBuf], variables: Option<Variables>) -> anyhow::Result<Vec<Request>> {
    files
        .iter()
        .map(|path| {
            let query = fs::read_to_string(path).with_context(|| format!("error reading {}", path.display()))?;
            let request = Request::new(query);

            Ok(match &variables {
                Some(variables) => request.variables(variables.clone()),
                None => request,
            })
        })
        .collect()
}

/// Documents the engine can't parse are executed like any other and fail there.
fn is_subscription(query: &str) -> bool {
    async_graphql_parser::parse_query(query).is_ok_and(|document| {
        document
            .operations
            .iter()
            .any(|(_, operation)| operation.node.ty == OperationType::Subscription)
    })
}
