use std::env;
use std::time::Duration;

use log::warn;

#[derive(Clone)]
pub struct Config {
    host: String,
    port: u16,
    db: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: String::from("127.0.0.1"),
            port: 27017,
            db: String::from("campus"),
        }
    }
}

impl Config {
    pub fn env() -> Option<Self> {
        let host = env::var("MONGO_HOST").ok();
        let port = env::var("MONGO_PORT")
            .unwrap_or_else(|_| "27017".to_string())
            .parse()
            .ok();
        let db = env::var("MONGO_DB").ok();

        if let (Some(host), Some(port), Some(db)) = (host, port, db) {
            Some(Self { host, port, db })
        } else {
            warn!("MONGO env is not configured, using defaults");
            None
        }
    }

    pub fn connect(&self) -> mongodb::Database {
        let options = mongodb::options::ClientOptions::builder()
            .hosts(vec![mongodb::options::ServerAddress::Tcp {
                host: self.host.to_owned(),
                port: Some(self.port),
            }])
            .server_selection_timeout(Some(Duration::from_secs(2)))
            .connect_timeout(Some(Duration::from_secs(5)))
            .build();

        match mongodb::Client::with_options(options).map(|client| client.database(&self.db)) {
            Ok(db) => db,
            Err(e) => panic!("Failed to connect to MongoDB: {e}"),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use testcontainers_modules::mongo::Mongo;
    use testcontainers_modules::testcontainers::ContainerAsync;
    use testcontainers_modules::testcontainers::runners::AsyncRunner;

    use super::Config;

    pub struct TestContainer {
        _mongo: ContainerAsync<Mongo>,
        pub config: Config,
    }

    impl TestContainer {
        pub async fn init() -> Self {
            let mongo = Mongo::default().start().await.unwrap();

            let config = Config {
                host: mongo.get_host().await.unwrap().to_string(),
                port: mongo.get_host_port_ipv4(27017).await.unwrap(),
                db: String::from("test_campus"),
            };

            Self {
                _mongo: mongo,
                config,
            }
        }
    }
}
