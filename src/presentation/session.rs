use crate::application::builders::request_builder::RequestBuilder;
use crate::application::config_store::ConfigStoreExt;
use crate::application::connections::ConnectionManager;
use crate::application::services::HttpRequestService;
use crate::infrastructure::config::{APP_NAME, DEBUG_KEY, JSON_KEY, LayeredConfig, VERBOSE_KEY};
use crate::infrastructure::logging::Logging;
use crate::infrastructure::output::{self, FlagSetting};
use crate::presentation::cli::{
    Cli, DescribeTarget, GlobalFlags, HttpCommand, ListTarget, SetTarget, SharedCommand,
};
use anyhow::{Result, anyhow};
use clap::CommandFactory;
use colored::Colorize;
use serde_json::Value;
use tracing::debug;

/// State shared by every command of a process or interactive session.
pub struct Session {
    connections: ConnectionManager<LayeredConfig>,
    request_service: HttpRequestService,
    logging: Option<Logging>,
}

impl Session {
    pub fn new(config: LayeredConfig, request_service: HttpRequestService) -> Self {
        Self {
            connections: ConnectionManager::new(config),
            request_service,
            logging: None,
        }
    }

    pub fn attach_logging(&mut self, logging: Logging) {
        self.logging = Some(logging);
    }

    pub fn connections(&self) -> &ConnectionManager<LayeredConfig> {
        &self.connections
    }

    fn config(&self) -> &LayeredConfig {
        self.connections.store()
    }

    fn config_mut(&mut self) -> &mut LayeredConfig {
        self.connections.store_mut()
    }

    pub fn json(&self) -> bool {
        self.config().get_bool(JSON_KEY)
    }

    pub fn verbose(&self) -> bool {
        self.config().get_bool(VERBOSE_KEY)
    }

    pub fn debug(&self) -> bool {
        self.config().get_bool(DEBUG_KEY)
    }

    /// Flags from the process command line. They hold for the whole session.
    pub fn apply_app_flags(&mut self, flags: &GlobalFlags) {
        for (key, set) in bool_flags(flags) {
            if set {
                self.config_mut().set_flag(key, Value::Bool(true));
            }
        }
    }

    /// Flags typed at the prompt. They hold for one command.
    pub fn apply_line_flags(&mut self, flags: &GlobalFlags) {
        for (key, set) in bool_flags(flags) {
            if set {
                self.config_mut().set_line_flag(key, Value::Bool(true));
            }
        }
        self.refresh_logging();
    }

    /// Selects the connection for the command about to run.
    pub fn begin_command(&mut self, connection: Option<String>) {
        self.connections.set_flag_override(connection);
        if let Err(err) = self.connections.init_connections() {
            eprintln!("{}", format!("Warning: {}", err).yellow());
        }
    }

    /// Drops everything the finished command's flags changed.
    pub fn end_command(&mut self) {
        debug!(
            depth = self.connections.depth(),
            set_by_flag = self.connections.previously_set_by_flag(),
            "Command finished"
        );
        self.connections.reset_connection();
        self.connections.set_flag_override(None);
        self.config_mut().clear_line_flags();
        self.refresh_logging();
    }

    pub fn refresh_logging(&self) {
        if let Some(logging) = &self.logging {
            logging.apply(self.debug(), self.verbose());
        }
    }

    /// Flips a boolean setting above file, env and flag values.
    pub fn toggle(&mut self, key: &str) -> bool {
        let value = !self.config().get_bool(key);
        self.config_mut().set(key, Value::Bool(value));
        self.refresh_logging();
        value
    }

    pub fn reload_config(&mut self) {
        self.config_mut().reload();
    }

    pub async fn run(&mut self, command: SharedCommand) -> Result<()> {
        match command {
            SharedCommand::Version => {
                println!("{}", env!("CARGO_PKG_VERSION"));
                Ok(())
            }
            SharedCommand::Config => {
                if let Some(path) = self.config().file_path() {
                    println!("{}", format!("Config file: {}", path.display()).dimmed());
                }
                output::print_settings(&self.config().all_settings());
                Ok(())
            }
            SharedCommand::Flags => {
                output::print_flags(&self.flag_settings());
                Ok(())
            }
            SharedCommand::Http { verb } => self.run_http(verb).await,
            SharedCommand::List {
                target: ListTarget::Connections,
            } => output::print_connection_list(&self.connections.list_connections(), self.json()),
            SharedCommand::Describe {
                target: DescribeTarget::Connection { names },
            } => self.describe_connections(&names),
            SharedCommand::Set {
                target: SetTarget::Connection { name },
            } => self.set_connection(&name),
        }
    }

    /// The global flags with the values in effect for this command.
    fn flag_settings(&self) -> Vec<FlagSetting> {
        let mut command = Cli::command();
        command.build();
        command
            .get_arguments()
            .filter(|arg| arg.is_global_set())
            .map(|arg| {
                let name = arg.get_id().as_str().to_string();
                let value = match name.as_str() {
                    VERBOSE_KEY => self.verbose().to_string(),
                    DEBUG_KEY => self.debug().to_string(),
                    JSON_KEY => self.json().to_string(),
                    "connection" => self
                        .connections
                        .current_connection()
                        .map(|c| c.name.clone())
                        .unwrap_or_default(),
                    "config" => self
                        .config()
                        .file_path()
                        .map(|p| p.display().to_string())
                        .unwrap_or_default(),
                    _ => String::new(),
                };
                FlagSetting {
                    short: arg.get_short(),
                    default: arg
                        .get_default_values()
                        .first()
                        .map(|v| v.to_string_lossy().into_owned())
                        .unwrap_or_default(),
                    name,
                    value,
                }
            })
            .collect()
    }

    fn describe_connections(&self, names: &[String]) -> Result<()> {
        let mut found = Vec::new();
        for name in names {
            match self.connections.find(name) {
                Some(conn) => found.push(conn),
                None => eprintln!("{}", format!("Couldn't find connection \"{}\"", name).yellow()),
            }
        }
        output::print_connection_details(&found, self.json())
    }

    fn set_connection(&mut self, name: &str) -> Result<()> {
        match self.connections.set_connection(name) {
            Ok(()) => {
                if self.verbose() {
                    if let Some(conn) = self.connections.current_connection() {
                        println!("Using connection {} [{}]", conn.name.green(), conn.service_url);
                    }
                }
                Ok(())
            }
            Err(err) => {
                eprintln!("{}", format!("Error: {}", err).red());
                output::print_connection_list(&self.connections.list_connections(), self.json())
            }
        }
    }

    async fn run_http(&self, verb: HttpCommand) -> Result<()> {
        match verb {
            HttpCommand::Get { path, headers } => self.send("GET", &path, &[], &headers).await,
            HttpCommand::Post { path, body, headers } => {
                self.send("POST", &path, &body, &headers).await
            }
            HttpCommand::Delete { path, body, headers } => {
                self.send("DELETE", &path, &body, &headers).await
            }
            HttpCommand::Send {
                method,
                path,
                body,
                headers,
            } => self.send(&method, &path, &body, &headers).await,
        }
    }

    async fn send(&self, method: &str, path: &str, body: &[String], headers: &[String]) -> Result<()> {
        let conn = self
            .connections
            .current_connection()
            .ok_or_else(|| anyhow!("No current connection"))?;
        let body = (!body.is_empty()).then(|| body.join(" "));

        let request = RequestBuilder::for_connection(conn, path)?
            .method(method)?
            .headers(headers)?
            .body(&body)?
            .build()?;

        if self.verbose() && !self.json() {
            println!(
                "{}",
                format!("{} {} via {}", request.method, request.url.as_str(), conn.name).cyan()
            );
        }

        let response = self.request_service.send_request(request).await?;
        output::print_response(&response, self.json())
    }

    /// Prompt showing the verbose/debug status and the current connection.
    pub fn prompt(&self) -> String {
        let mut status = String::new();
        if self.verbose() {
            status.push('v');
        }
        if self.debug() {
            status.push('d');
        }
        if !status.is_empty() {
            status.push(' ');
        }
        let (name, url) = self
            .connections
            .current_connection()
            .map(|c| (c.name.clone(), c.service_url.clone()))
            .unwrap_or_default();
        format!(
            "{} [{}{} {}]: ",
            APP_NAME.bold(),
            status,
            name.green(),
            url.dimmed()
        )
    }
}

fn bool_flags(flags: &GlobalFlags) -> [(&'static str, bool); 3] {
    [
        (VERBOSE_KEY, flags.verbose),
        (DEBUG_KEY, flags.debug),
        (JSON_KEY, flags.json),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::MockHttpClient;
    use crate::domain::entities::{Method, Response};
    use hyper::StatusCode;
    use std::time::Duration;

    const CONFIG: &str = r#"
connections:
  alpha:
    serviceURL: http://alpha.local
    authToken: alpha-token
  beta:
    serviceURL: http://beta.local
    headers:
      X-Beta: "yes"
"#;

    fn ok_response() -> Response {
        Response {
            status: StatusCode::OK,
            body: "{}".to_string(),
            elapsed: Duration::ZERO,
        }
    }

    fn session(client: MockHttpClient) -> Session {
        let config = LayeredConfig::from_yaml_str(CONFIG).unwrap();
        Session::new(config, HttpRequestService::new(Box::new(client)))
    }

    fn current(session: &Session) -> String {
        session
            .connections()
            .current_connection()
            .map(|c| c.name.clone())
            .unwrap_or_default()
    }

    #[tokio::test]
    async fn requests_go_to_the_current_connection() {
        let mut client = MockHttpClient::new();
        client
            .expect_send()
            .withf(|req| {
                req.method == Method::Get
                    && req.url.as_str() == "http://alpha.local/users"
                    && req
                        .headers
                        .contains(&("Authorization".to_string(), "Bearer alpha-token".to_string()))
            })
            .times(1)
            .returning(|_| Ok(ok_response()));

        let mut s = session(client);
        s.begin_command(None);
        s.run(SharedCommand::Http {
            verb: HttpCommand::Get {
                path: "/users".to_string(),
                headers: Vec::new(),
            },
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn send_accepts_any_supported_method() {
        let mut client = MockHttpClient::new();
        client
            .expect_send()
            .withf(|req| req.method == Method::Put && req.body.is_some())
            .times(1)
            .returning(|_| Ok(ok_response()));

        let mut s = session(client);
        s.begin_command(None);
        s.run(SharedCommand::Http {
            verb: HttpCommand::Send {
                method: "put".to_string(),
                path: "/items/1".to_string(),
                body: vec![r#"{"a":"#.to_string(), "1}".to_string()],
                headers: Vec::new(),
            },
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn set_connection_failure_keeps_current() {
        let mut s = session(MockHttpClient::new());
        s.begin_command(None);
        assert_eq!(current(&s), "alpha");

        s.run(SharedCommand::Set {
            target: SetTarget::Connection {
                name: "nowhere".to_string(),
            },
        })
        .await
        .unwrap();
        assert_eq!(current(&s), "alpha");
    }

    #[test]
    fn line_flags_last_one_command() {
        let mut s = session(MockHttpClient::new());
        s.begin_command(None);
        s.end_command();

        s.apply_line_flags(&GlobalFlags {
            json: true,
            ..GlobalFlags::default()
        });
        assert!(s.json());
        s.end_command();
        assert!(!s.json());
    }

    #[test]
    fn app_flags_persist_until_toggled() {
        let mut s = session(MockHttpClient::new());
        s.apply_app_flags(&GlobalFlags {
            verbose: true,
            ..GlobalFlags::default()
        });
        s.end_command();
        assert!(s.verbose());

        assert!(!s.toggle(VERBOSE_KEY));
        s.end_command();
        assert!(!s.verbose());
    }

    #[test]
    fn flag_settings_report_current_values() {
        let mut s = session(MockHttpClient::new());
        s.begin_command(Some("beta".to_string()));
        s.apply_line_flags(&GlobalFlags {
            json: true,
            ..GlobalFlags::default()
        });

        let settings = s.flag_settings();
        let find = |name: &str| settings.iter().find(|f| f.name == name).unwrap();
        assert_eq!(find("json").value, "true");
        assert_eq!(find("json").short, Some('j'));
        assert_eq!(find("json").default, "false");
        assert_eq!(find("verbose").value, "false");
        assert_eq!(find("connection").value, "beta");
        assert_eq!(find("connection").default, "");
        assert!(settings.iter().any(|f| f.name == "config"));
    }

    #[test]
    fn prompt_shows_status_and_connection() {
        colored::control::set_override(false);
        let mut s = session(MockHttpClient::new());
        s.begin_command(Some("beta".to_string()));
        s.toggle(DEBUG_KEY);
        assert_eq!(s.prompt(), "hurlsh [d beta http://beta.local]: ");
    }
}
