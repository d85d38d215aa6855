//! Server lookups over the parsed tree

use super::{Config, Http, PropertyAccess, Server};

impl Http {
    /// Number of server blocks
    pub fn servers_num(&self) -> usize {
        self.servers.len()
    }

    /// `name:http` / `name:https` for every server name, in declaration order.
    ///
    /// A server counts as https when its `listen` value mentions `http2`,
    /// `ssl` or `443` anywhere.
    pub fn servers_list(&self) -> Vec<String> {
        let mut result = Vec::new();

        for server in &self.servers {
            let listen = server.properties.get("listen");
            let scheme = if ["http2", "ssl", "443"].iter().any(|p| listen.contains(p)) {
                "https"
            } else {
                "http"
            };

            for name in server.names() {
                result.push(format!("{}:{}", name, scheme));
            }
        }

        result
    }

    /// First server named `name` whose `listen` tokens satisfy `protocol`
    pub fn find_server(&self, name: &str, protocol: &str) -> Option<&Server> {
        self.servers.iter().find(|server| {
            server.names().iter().any(|n| n == name)
                && server
                    .protocols()
                    .iter()
                    .any(|token| protocol_matches(token, protocol))
        })
    }
}

impl Server {
    /// Tokens of `server_name`
    pub fn names(&self) -> Vec<String> {
        split_tokens(&self.properties.get("server_name"))
    }

    /// Tokens of `listen`
    pub fn protocols(&self) -> Vec<String> {
        split_tokens(&self.properties.get("listen"))
    }
}

impl Config {
    /// Number of servers; zero when there is no `http` block
    pub fn servers_num(&self) -> usize {
        self.http.as_ref().map_or(0, Http::servers_num)
    }

    /// See [`Http::servers_list`]; empty when there is no `http` block
    pub fn servers_list(&self) -> Vec<String> {
        self.http.as_ref().map(Http::servers_list).unwrap_or_default()
    }

    /// See [`Http::find_server`]
    pub fn find_server(&self, name: &str, protocol: &str) -> Option<&Server> {
        self.http.as_ref()?.find_server(name, protocol)
    }
}

/// Check if a `listen` token satisfies the requested protocol
pub fn protocol_matches(token: &str, protocol: &str) -> bool {
    let implied = match token {
        "http2" | "spdy" | "ssl" | "443" => Some("https"),
        "80" => Some("http"),
        _ => None,
    };

    token == protocol || implied == Some(protocol)
}

fn split_tokens(value: &str) -> Vec<String> {
    value.split_whitespace().map(str::to_string).collect()
}
