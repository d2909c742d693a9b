use tracing::warn;

use crate::handlers::emit;
use crate::pipeline::ContentHandler;
use crate::sink::{Diagnostic, DiagnosticKind, Sink};
use crate::types::{Event, EventPayload, EventType};

/// Consumes incident events and reports each one as a diagnostic.
#[derive(Debug)]
pub struct IncidentHandler<D> {
    sink: D,
}

impl<D> IncidentHandler<D>
where
    D: Sink,
{
    pub fn new(sink: D) -> Self {
        Self { sink }
    }
}

impl<D> ContentHandler for IncidentHandler<D>
where
    D: Sink,
{
    fn process_event(&mut self, event: Event) -> Option<Event> {
        let header = event.header;
        let incident = match event.payload {
            EventPayload::Incident(incident) => incident,
            payload => return Some(Event::new(header, payload)),
        };

        let message = format!(
            "Incident: Event type: {} length: {} next pos: {} type= {} message= {}",
            EventType::Incident,
            header.event_length,
            header.next_position,
            incident.incident.code(),
            incident.message
        );
        warn!(
            incident = incident.incident.code(),
            next_position = header.next_position,
            message = %incident.message,
            "incident reported by the server"
        );
        emit(&self.sink, Diagnostic::new(DiagnosticKind::Incident, message));

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::memory::MemorySink;
    use crate::test_utils::event::EventStreamBuilder;

    #[test]
    fn test_incident_is_consumed_and_reported() {
        let sink = MemorySink::new();
        let mut handler = IncidentHandler::new(sink.clone());
        let event = EventStreamBuilder::starting_at(120)
            .incident(1, "lost events")
            .build()
            .remove(0);
        let length = event.header.event_length;
        let next_position = event.header.next_position;

        assert!(handler.process_event(event).is_none());
        assert_eq!(
            sink.lines(),
            vec![format!(
                "Incident: Event type: Incident length: {length} next pos: {next_position} type= 1 message= lost events"
            )]
        );
    }

    #[test]
    fn test_other_events_pass_through() {
        let sink = MemorySink::new();
        let mut handler = IncidentHandler::new(sink.clone());
        let event = EventStreamBuilder::new().xid(1).build().remove(0);

        assert_eq!(handler.process_event(event.clone()), Some(event));
        assert!(sink.outputs().is_empty());
    }
}
