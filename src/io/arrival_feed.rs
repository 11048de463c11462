use std::io::{BufRead, ErrorKind};
use std::thread;
use std::time::Instant;

use crossbeam_channel::{Receiver, TryRecvError};

/// A command that was requested while a scheduler was running.
#[derive(Debug, Clone)]
pub struct Arrival {
    pub command: String,
    pub read_at: Instant,
}

/// Source of new work for the online schedulers.
///
/// `poll` never blocks. Once the underlying input ends the feed keeps
/// returning empty batches.
pub trait ArrivalFeed {
    fn poll(&mut self) -> Vec<Arrival>;

    fn is_exhausted(&self) -> bool;
}

/// Feed backed by a reader thread over a line-oriented input.
pub struct LineFeed {
    receiver: Receiver<Arrival>,
    exhausted: bool,
}

impl LineFeed {
    pub fn spawn<R: BufRead + Send + 'static>(reader: R) -> LineFeed {
        let (sender, receiver) = crossbeam_channel::unbounded();

        thread::spawn(move || {
            let mut reader = reader;
            let mut buf = Vec::new();
            loop {
                buf.clear();
                match reader.read_until(b'\n', &mut buf) {
                    Ok(0) => break,
                    Ok(_) => {}
                    Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                    Err(err) => {
                        log::warn!("Arrival feed read failed: {}", err);
                        break;
                    }
                }

                // Invalid UTF-8 bytes become U+FFFD.
                let line = String::from_utf8_lossy(&buf);
                let command = line.trim();
                if command.is_empty() {
                    continue;
                }

                let arrival = Arrival {
                    command: command.to_string(),
                    read_at: Instant::now(),
                };

                if sender.send(arrival).is_err() {
                    break;
                }
            }
            log::debug!("Arrival feed reached end of input");
        });

        LineFeed {
            receiver,
            exhausted: false,
        }
    }

    pub fn stdin() -> LineFeed {
        LineFeed::spawn(std::io::BufReader::new(std::io::stdin()))
    }
}

impl ArrivalFeed for LineFeed {
    fn poll(&mut self) -> Vec<Arrival> {
        let mut arrivals = Vec::new();

        loop {
            match self.receiver.try_recv() {
                Ok(arrival) => arrivals.push(arrival),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if !self.exhausted {
                        log::info!("Arrival feed exhausted; serving pending work only");
                    }
                    self.exhausted = true;
                    break;
                }
            }
        }

        arrivals
    }

    fn is_exhausted(&self) -> bool {
        self.exhausted
    }
}

/// Hands out pre-arranged batches, one per poll.
#[cfg(test)]
pub(crate) struct ScriptedFeed {
    batches: std::collections::VecDeque<Vec<String>>,
}

#[cfg(test)]
impl ScriptedFeed {
    pub fn new(batches: Vec<Vec<&str>>) -> ScriptedFeed {
        ScriptedFeed {
            batches: batches
                .into_iter()
                .map(|batch| batch.into_iter().map(String::from).collect())
                .collect(),
        }
    }
}

#[cfg(test)]
impl ArrivalFeed for ScriptedFeed {
    fn poll(&mut self) -> Vec<Arrival> {
        let now = Instant::now();
        self.batches
            .pop_front()
            .unwrap_or_default()
            .into_iter()
            .map(|command| Arrival {
                command,
                read_at: now,
            })
            .collect()
    }

    fn is_exhausted(&self) -> bool {
        self.batches.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::time::Duration;

    use super::*;

    fn drain(feed: &mut LineFeed) -> Vec<String> {
        let mut commands = Vec::new();
        for _ in 0..200 {
            commands.extend(feed.poll().into_iter().map(|a| a.command));
            if feed.is_exhausted() {
                break;
            }
            thread::sleep(Duration::from_millis(5));
        }
        commands
    }

    #[test]
    fn test_line_feed_delivers_in_order_then_exhausts() {
        let mut feed = LineFeed::spawn(Cursor::new("sleep 1\n\n  echo hi  \ntrue\n"));
        let commands = drain(&mut feed);

        assert_eq!(commands, vec!["sleep 1", "echo hi", "true"]);
        assert!(feed.is_exhausted());
        assert!(feed.poll().is_empty());
    }

    #[test]
    fn test_line_feed_survives_invalid_utf8() {
        let mut feed = LineFeed::spawn(Cursor::new(b"first\n\xff\xfe\nsecond\nlast".to_vec()));
        let commands = drain(&mut feed);

        assert_eq!(commands.len(), 4);
        assert_eq!(commands[0], "first");
        assert_eq!(commands[1], "\u{FFFD}\u{FFFD}");
        assert_eq!(&commands[2..], ["second", "last"]);
    }

    #[test]
    fn test_scripted_feed_one_batch_per_poll() {
        let mut feed = ScriptedFeed::new(vec![vec!["a", "b"], vec![], vec!["c"]]);
        assert_eq!(feed.poll().len(), 2);
        assert!(feed.poll().is_empty());
        assert_eq!(feed.poll()[0].command, "c");
        assert!(feed.is_exhausted());
    }
}
