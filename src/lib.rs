use crate::infrastructure::botdata;

pub mod entities;
pub mod models;

pub mod commands {
    pub mod builtins;
    pub mod info;
    pub mod roles;
    pub mod server;
    pub mod showcase;
    pub mod stats;
    pub mod user;
    pub mod welcome;
}

pub mod infrastructure {
    pub mod botdata;
    pub mod colors;
    pub mod embeds;
    pub mod environment;
    pub mod event_handler;
    pub mod ids;
    pub mod message_components;
    pub mod replies;
    pub mod util;
}

pub mod events {
    pub mod components;
    pub mod guild_member;
    pub mod server_stats;
    pub mod welcome;
}

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, botdata::Data, Error>;
