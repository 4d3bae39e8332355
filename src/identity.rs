//! Identity rotation
//!
//! An identity is the network persona one attempt runs under: outbound
//! proxy, user agent and a spoofed client IP. The rotation builds the
//! cross-product lazily, proxies outermost, then user agents, then IPs, so
//! unproxied attempts with the most common agents come first.

use crate::utils::config::ExtractorSettings;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt;

/// Network persona for one attempt
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity {
    pub proxy: Option<String>,
    pub user_agent: String,
    pub spoofed_client_ip: String,
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "proxy={} ip={} ua={}",
            self.proxy.as_deref().unwrap_or("none"),
            self.spoofed_client_ip,
            self.user_agent
        )
    }
}

/// Fixed proxy and user-agent lists plus the size of the IP set
#[derive(Debug, Clone)]
pub struct IdentityRotation {
    proxies: Vec<Option<String>>,
    user_agents: Vec<String>,
    ip_count: usize,
    seed: Option<u64>,
}

impl IdentityRotation {
    pub fn new(proxies: Vec<Option<String>>, user_agents: Vec<String>, ip_count: usize) -> Self {
        Self {
            proxies,
            user_agents,
            ip_count,
            seed: None,
        }
    }

    pub fn from_settings(settings: &ExtractorSettings) -> Self {
        Self {
            proxies: settings.proxies.clone(),
            user_agents: settings.user_agents.clone(),
            ip_count: settings.spoofed_ip_count,
            seed: settings.ip_seed,
        }
    }

    /// Fix the IP generator seed so the space replays identically
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Build a search space with a freshly generated IP set
    pub fn generate(&self) -> IdentitySpace {
        match self.seed {
            Some(seed) => self.generate_with(&mut StdRng::seed_from_u64(seed)),
            None => self.generate_with(&mut rand::thread_rng()),
        }
    }

    pub fn generate_with<R: Rng + ?Sized>(&self, rng: &mut R) -> IdentitySpace {
        let ips = (0..self.ip_count).map(|_| random_ipv4(rng)).collect();
        IdentitySpace {
            proxies: self.proxies.clone(),
            user_agents: self.user_agents.clone(),
            ips,
        }
    }
}

/// IPv4-looking string with every octet in 1..=255
pub fn random_ipv4<R: Rng + ?Sized>(rng: &mut R) -> String {
    let octets: [u8; 4] = [
        rng.gen_range(1..=255),
        rng.gen_range(1..=255),
        rng.gen_range(1..=255),
        rng.gen_range(1..=255),
    ];
    format!("{}.{}.{}.{}", octets[0], octets[1], octets[2], octets[3])
}

/// The identities of one request, enumerated on demand
#[derive(Debug, Clone)]
pub struct IdentitySpace {
    proxies: Vec<Option<String>>,
    user_agents: Vec<String>,
    ips: Vec<String>,
}

impl IdentitySpace {
    pub fn len(&self) -> usize {
        self.proxies.len() * self.user_agents.len() * self.ips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn ips(&self) -> &[String] {
        &self.ips
    }

    /// Identity at a position in enumeration order
    pub fn get(&self, index: usize) -> Option<Identity> {
        if index >= self.len() {
            return None;
        }
        let per_proxy = self.user_agents.len() * self.ips.len();
        let proxy = &self.proxies[index / per_proxy];
        let rest = index % per_proxy;
        let user_agent = &self.user_agents[rest / self.ips.len()];
        let ip = &self.ips[rest % self.ips.len()];

        Some(Identity {
            proxy: proxy.clone(),
            user_agent: user_agent.clone(),
            spoofed_client_ip: ip.clone(),
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = Identity> + '_ {
        self.proxies.iter().flat_map(move |proxy| {
            self.user_agents.iter().flat_map(move |user_agent| {
                self.ips.iter().map(move |ip| Identity {
                    proxy: proxy.clone(),
                    user_agent: user_agent.clone(),
                    spoofed_client_ip: ip.clone(),
                })
            })
        })
    }
}
