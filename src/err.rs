use std::io;

quick_error! {
    #[derive(Debug)]
    pub enum ParseError {
        MalformedSentence {
            description("Malformed sentence")
            display("Sentence does not start with the XGPS tag")
        }
        InsufficientFields(found: usize) {
            description("Insufficient fields")
            display("Expected at least 5 fields, found {}", found)
        }
    }
}

quick_error! {
    #[derive(Debug)]
    pub enum SinkError {
        Rejected(reason: String) {
            description("Fix rejected")
            display("Sink rejected the fix: {}", reason)
        }
        Disconnected {
            description("Sink disconnected")
            display("The receiving end of the sink is gone")
        }
    }
}

quick_error! {
    #[derive(Debug)]
    pub enum SessionError {
        Bind(port: u16, err: io::Error) {
            description("Could not bind")
            display("Could not bind UDP port {}: {}", port, err)
            cause(err)
        }
        Spawn(err: io::Error) {
            description("Could not spawn worker")
            display("Could not start the ingest worker thread: {}", err)
            cause(err)
        }
        Transport(err: io::Error) {
            description("Transport failure")
            display("Encountered I/O error while receiving: {}", err)
            cause(err)
        }
        WorkerPanicked {
            description("Worker panicked")
            display("The ingest worker thread panicked")
        }
    }
}

impl ParseError {
    /// Whether the sentence was discarded before any field was looked at.
    pub fn is_malformed(&self) -> bool {
        match self {
            ParseError::MalformedSentence => true,
            ParseError::InsufficientFields(_) => false,
        }
    }
}
