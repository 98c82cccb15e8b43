//! Dispatch of received messages.
use super::{Port, QueuedMessage, State};
use crate::message::header::{ControlMessageType, Header, MessageType};
use crate::message::pdo::PowerDataObject;
use crate::message::{Data, Message};
use crate::timers::Timer;
use crate::{Driver, PortType, PowerRole, SpecificationRevision};

impl<DRIVER: Driver, TIMER: Timer> Port<DRIVER, TIMER> {
    /// Handle a message that the port controller received.
    ///
    /// Retransmissions (same message ID as the previous message) are dropped, except for soft resets.
    pub fn pd_receive(&mut self, bytes: &[u8]) {
        let message = match Message::from_bytes(bytes) {
            Ok(message) => message,
            Err(error) => {
                warn!("dropping malformed message: {:?}", error);
                return;
            }
        };

        let header = message.header;
        trace!(
            "received {:?}, id {} [state {}]",
            header.message_type(),
            header.message_id(),
            self.state
        );

        if self.attached {
            self.dispatch(header, message.data);
        }

        if !self.state_machine_running {
            self.send_queued_messages();
            self.drain_deferred_events();
        }
    }

    fn dispatch(&mut self, header: Header, data: Option<Data>) {
        let message_type = header.message_type();
        let message_id = header.message_id();

        if self.rx_msgid == Some(message_id) && message_type != MessageType::Control(ControlMessageType::SoftReset) {
            debug!("dropping retransmitted message {}", message_id);
            return;
        }
        self.rx_msgid = Some(message_id);

        if header.port_data_role() == self.data_role {
            error!("data role mismatch, both ports are {:?}", self.data_role);
            self.set_state(State::ErrorRecovery, 0);
            return;
        }

        match (message_type, data) {
            (MessageType::Control(control), _) => self.handle_control(control),
            (MessageType::Data(_), Some(data)) => self.handle_data(header, data),
            (MessageType::Data(_), None) => (),
            (MessageType::Extended(raw), _) => {
                debug!("unsupported extended message {}", raw);
                self.queue_message(QueuedMessage::NotSupported);
            }
        }
    }

    fn queue_message(&mut self, message: QueuedMessage) {
        self.queued_message = Some(message);
    }

    fn handle_control(&mut self, message_type: ControlMessageType) {
        match message_type {
            ControlMessageType::GoodCRC | ControlMessageType::Ping | ControlMessageType::GotoMin => (),
            ControlMessageType::GetSourceCap => {
                if self.state.is_ready() {
                    self.queue_message(QueuedMessage::SourceCapabilities);
                } else {
                    self.queue_message(QueuedMessage::Reject);
                }
            }
            ControlMessageType::GetSinkCap => {
                if self.state.is_ready() {
                    self.queue_message(QueuedMessage::SinkCapabilities);
                } else {
                    self.queue_message(QueuedMessage::Reject);
                }
            }
            ControlMessageType::PsRdy => {
                if self.state == State::SnkTransitionSink {
                    if self.vbus_present {
                        self.set_current_limit(self.req_current_limit, self.req_supply_voltage);
                        self.explicit_contract = true;
                        self.set_state(State::SnkReady, 0);
                    } else {
                        self.set_state(State::SnkTransitionSinkVbus, 0);
                    }
                }
            }
            ControlMessageType::Reject | ControlMessageType::Wait | ControlMessageType::NotSupported => {
                if self.state == State::SnkNegotiateCapabilities {
                    if self.explicit_contract {
                        self.set_state(State::SnkReady, 0);
                    } else {
                        self.set_state(State::SnkWaitCapabilities, 0);
                    }
                }
            }
            ControlMessageType::Accept => match self.state {
                State::SnkNegotiateCapabilities => self.set_state(State::SnkTransitionSink, 0),
                State::SoftResetSend => {
                    self.reset_message_ids();
                    match self.power_role {
                        PowerRole::Source => self.set_state(State::SrcSendCapabilities, 0),
                        PowerRole::Sink => self.set_state(State::SnkWaitCapabilities, 0),
                    }
                }
                _ => (),
            },
            ControlMessageType::SoftReset => self.set_state(State::SoftReset, 0),
            ControlMessageType::DrSwap => {
                if self.config.port_type != PortType::DualRole {
                    self.queue_message(QueuedMessage::Reject);
                } else if self.state.is_ready() {
                    self.set_state(State::DrSwapAccept, 0);
                } else {
                    self.queue_message(QueuedMessage::Wait);
                }
            }
            ControlMessageType::PrSwap
            | ControlMessageType::VconnSwap
            | ControlMessageType::GetSourceCapExtended
            | ControlMessageType::GetStatus
            | ControlMessageType::FrSwap
            | ControlMessageType::GetPpsStatus
            | ControlMessageType::GetCountryCodes => self.queue_message(QueuedMessage::NotSupported),
            ControlMessageType::Other(raw) => warn!("unhandled control message {}", raw),
        }
    }

    /// Adopt the partner's revision, if it is lower than the current one.
    fn adopt_revision(&mut self, header: Header) {
        if let Ok(revision) = header.spec_revision() {
            if revision < self.negotiated_rev && revision != SpecificationRevision::R1_0 {
                debug!("lowering revision to {:?}", revision);
                self.negotiated_rev = revision;
            }
        }
    }

    fn handle_data(&mut self, header: Header, data: Data) {
        match data {
            Data::SourceCapabilities(pdos) => {
                if self.power_role != PowerRole::Sink {
                    warn!("source capabilities received as source");
                    self.set_state(State::SoftResetSend, 0);
                    return;
                }

                if let Err(error) = pdos.validate() {
                    warn!("dropping invalid source capabilities: {}", error);
                    return;
                }

                self.adopt_revision(header);

                if let Some(PowerDataObject::FixedSupply(vsafe_5v)) = pdos.pdos().first() {
                    self.wait_dr_swap_message = vsafe_5v.dual_role_power() && vsafe_5v.dual_role_data();
                }

                self.source_caps = pdos;
                self.set_state(State::SnkNegotiateCapabilities, 0);
            }
            Data::Request(rdo) => {
                if self.power_role != PowerRole::Source {
                    warn!("request received as sink");
                    self.set_state(State::SoftResetSend, 0);
                    return;
                }

                if header.spec_revision() == Ok(SpecificationRevision::R1_0) {
                    self.queue_message(QueuedMessage::Reject);
                    return;
                }

                self.adopt_revision(header);
                self.sink_request = rdo;
                self.set_state(State::SrcNegotiateCapabilities, 0);
            }
            Data::SinkCapabilities(pdos) => {
                debug!("partner sink capabilities with {} objects", pdos.len());
                self.sink_caps = pdos;
            }
            Data::Other(_) => {
                debug!("unsupported data message {:?}", header.message_type());
                self.queue_message(QueuedMessage::NotSupported);
            }
        }
    }
}
