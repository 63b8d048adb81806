use std::collections::VecDeque;

use crate::log;

pub struct Service<R> {
    repository: R,
}

impl<R> Service<R> {
    pub fn new(repository: R) -> Self {
        Self { repository }
    }
}

impl<R: log::Repository> log::Service for Service<R> {
    fn get_log_entries(&self) -> Result<VecDeque<log::Entry>, log::Error> {
        self.repository.read_entries()
    }

    fn add_log_entry(&self, entry: log::Entry) -> Result<(), log::Error> {
        self.repository.write_entry(entry)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use ::log::Level;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::log::Service as _;

    #[derive(Default)]
    struct Entries(Mutex<VecDeque<log::Entry>>);

    impl log::Repository for Entries {
        fn read_entries(&self) -> Result<VecDeque<log::Entry>, log::Error> {
            self.0
                .lock()
                .map(|entries| entries.clone())
                .map_err(|err| log::Error::Unknown(err.to_string()))
        }

        fn write_entry(&self, entry: log::Entry) -> Result<(), log::Error> {
            self.0
                .lock()
                .map(|mut entries| entries.push_front(entry))
                .map_err(|err| log::Error::Unknown(err.to_string()))
        }
    }

    fn entry(message: &str) -> log::Entry {
        log::Entry {
            time: "May 06 18:00:00".to_string(),
            level: Level::Error,
            message: message.to_string(),
        }
    }

    #[test]
    fn test_log_entries() {
        let service = Service::new(Entries::default());

        service.add_log_entry(entry("first")).unwrap();
        service.add_log_entry(entry("second")).unwrap();

        assert_eq!(
            service.get_log_entries().unwrap(),
            VecDeque::from([entry("second"), entry("first")])
        );
    }
}
