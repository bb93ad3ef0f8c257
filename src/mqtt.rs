// openHASP speaks MQTT: commands go to <prefix>/command/<object>.<property>,
// the plate reports itself on <prefix>/LWT and touch events on
// <prefix>/state/....
extern crate rumqttc;

use crate::result;
use crate::scheduler::SchedulerHandle;

const KEEP_ALIVE: std::time::Duration = std::time::Duration::from_secs(60);
const RECONNECT_PAUSE: std::time::Duration = std::time::Duration::from_secs(5);
const REQUEST_CAPACITY: usize = 64;

/// Delivers one display property update.
pub trait Publisher {
    fn publish(&mut self, topic: &str, payload: &str) -> result::DashResult<()>;
}

#[derive(Debug, Clone)]
pub struct Broker {
    pub host: String,
    pub port: u16,
    pub user: Option<String>,
    pub password: Option<String>,
}

fn clean_prefix(prefix: &str) -> &str {
    return prefix.trim_matches('/');
}

/// "<prefix>/command/<address>". A leading copy of the prefix or a slash on
/// the address is dropped.
pub fn command_topic(prefix: &str, address: &str) -> String {
    let prefix = clean_prefix(prefix);
    let address = address.trim_start_matches('/');
    let address = address.strip_prefix(prefix).unwrap_or(address).trim_start_matches('/');
    return format!("{}/command/{}", prefix, address);
}

pub fn status_topic(prefix: &str) -> String {
    return format!("{}/LWT", clean_prefix(prefix));
}

pub fn state_topic(prefix: &str) -> String {
    return format!("{}/state/#", clean_prefix(prefix));
}

#[derive(Debug, PartialEq)]
pub enum DeviceMessage {
    Online,
    Offline(String),
    Interaction,
    Other,
}

pub fn classify_message(topic: &str, payload: &str) -> DeviceMessage {
    if topic.ends_with("LWT") {
        if payload.trim().eq_ignore_ascii_case("online") {
            return DeviceMessage::Online;
        }
        return DeviceMessage::Offline(payload.to_string());
    }
    if topic.contains("/state/") {
        return DeviceMessage::Interaction;
    }
    return DeviceMessage::Other;
}

pub struct MqttPublisher {
    client: rumqttc::Client,
}

impl Publisher for MqttPublisher {
    fn publish(&mut self, topic: &str, payload: &str) -> result::DashResult<()> {
        debug!("{} = {}", topic, payload);
        self.client.publish(topic, rumqttc::QoS::AtMostOnce, false, payload.as_bytes().to_vec())?;
        return Ok(());
    }
}

impl MqttPublisher {
    pub fn disconnect(&self) {
        if let Err(err) = self.client.disconnect() {
            debug!("MQTT disconnect: {}", err);
        }
    }
}

/// Connects to the broker and starts the listener thread. The listener only
/// ever pokes the scheduler; it never publishes layout itself.
pub fn connect(broker: &Broker, prefix: &str, scheduler: SchedulerHandle)
               -> result::DashResult<(MqttPublisher, std::thread::JoinHandle<()>)> {
    let client_id = format!("vvodash-{}", std::process::id());
    let mut options = rumqttc::MqttOptions::new(client_id, broker.host.clone(), broker.port);
    options.set_keep_alive(KEEP_ALIVE);
    if let (Some(user), Some(password)) = (&broker.user, &broker.password) {
        options.set_credentials(user.clone(), password.clone());
    }

    info!("Connecting to MQTT broker {}:{}", broker.host, broker.port);
    let (client, connection) = rumqttc::Client::new(options, REQUEST_CAPACITY);

    let listener_client = client.clone();
    let prefix = prefix.to_string();
    let listener = std::thread::Builder::new()
        .name("mqtt".to_string())
        .spawn(move || listen(connection, listener_client, &prefix, &scheduler))?;

    return Ok((MqttPublisher{client: client}, listener));
}

fn listen(mut connection: rumqttc::Connection,
          client: rumqttc::Client,
          prefix: &str,
          scheduler: &SchedulerHandle) {
    use rumqttc::{Event, Packet};

    for notification in connection.iter() {
        if scheduler.is_shutdown() {
            break;
        }
        match notification {
            Ok(Event::Incoming(Packet::ConnAck(_))) => {
                // Subscriptions don't survive a reconnect with a clean session.
                for topic in &[status_topic(prefix), state_topic(prefix)] {
                    info!("Subscribing to {}", topic);
                    if let Err(err) = client.try_subscribe(topic.as_str(), rumqttc::QoS::AtMostOnce) {
                        error!("Subscribing to {} failed: {}", topic, err);
                    }
                }
            },
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                let payload = String::from_utf8_lossy(&publish.payload);
                match classify_message(&publish.topic, &payload) {
                    DeviceMessage::Online => {
                        info!("Display online ({}), refreshing", publish.topic);
                        scheduler.request_refresh();
                    },
                    DeviceMessage::Offline(status) => warn!("Display offline: {}", status),
                    DeviceMessage::Interaction => info!("Interaction: {} : {}", publish.topic, payload),
                    DeviceMessage::Other => debug!("Ignoring {} : {}", publish.topic, payload),
                }
            },
            Ok(_) => {},
            Err(err) => {
                warn!("MQTT connection error: {}", err);
                std::thread::sleep(RECONNECT_PAUSE);
            },
        }
    }
    debug!("MQTT listener stopped");
}

#[cfg(test)]
mod tests {
    use super::DeviceMessage;

    #[test]
    fn command_topics() {
        assert_eq!("hasp/plate/command/p2b11.text", super::command_topic("hasp/plate", "p2b11.text"));
        assert_eq!("hasp/plate/command/p2b11.text", super::command_topic("/hasp/plate/", "/p2b11.text"));
        assert_eq!("hasp/plate/command/p2b11.text", super::command_topic("hasp/plate", "hasp/plate/p2b11.text"));
    }

    #[test]
    fn subscription_topics() {
        assert_eq!("hasp/plate_willi_1/LWT", super::status_topic("hasp/plate_willi_1/"));
        assert_eq!("hasp/plate_willi_1/state/#", super::state_topic("hasp/plate_willi_1"));
    }

    #[test]
    fn classify() {
        assert_eq!(DeviceMessage::Online, super::classify_message("hasp/plate/LWT", "online"));
        assert_eq!(DeviceMessage::Online, super::classify_message("hasp/plate/LWT", "Online"));
        assert_eq!(DeviceMessage::Offline("offline".to_string()),
                   super::classify_message("hasp/plate/LWT", "offline"));
        assert_eq!(DeviceMessage::Interaction,
                   super::classify_message("hasp/plate/state/p2b10", "{\"event\":\"down\"}"));
        assert_eq!(DeviceMessage::Other, super::classify_message("hasp/plate/command/p1b1.text", "x"));
    }
}
