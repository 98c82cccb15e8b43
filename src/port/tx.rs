//! Blocking transmission of messages.
use tcpm_traits::MAX_MESSAGE_SIZE;

use super::{Error, Port, QueuedMessage, TransmitError};
use crate::message::header::{ControlMessageType, DataMessageType, Header};
use crate::message::{Data, Message};
use crate::negotiator;
use crate::timers::{Timer, TimerType};
use crate::{Driver, DriverEvent, TransmitStatus, TransmitType};

impl<DRIVER: Driver, TIMER: Timer> Port<DRIVER, TIMER> {
    fn header_template(&self) -> Header {
        Header::new_template(self.data_role, self.power_role, self.negotiated_rev)
    }

    /// Start a transmission and wait for its completion.
    ///
    /// Driver events that arrive in the meantime are held back, and handled after the current run.
    fn transmit(&mut self, transmit_type: TransmitType, message: Option<&Message>) -> Result<(), TransmitError> {
        let mut buf = [0u8; MAX_MESSAGE_SIZE];
        let data = match message {
            Some(message) => {
                let len = message.to_bytes(&mut buf);
                Some(&buf[..len])
            }
            None => None,
        };

        self.tx_status = None;
        self.driver.pd_transmit(transmit_type, data, self.negotiated_rev)?;

        for _ in 0..TimerType::TcpcTxTimeout.millis() {
            while let Some(event) = self.driver.poll_event() {
                match event {
                    DriverEvent::TransmitComplete(status) => self.pd_transmit_complete(status),
                    event => {
                        if self.deferred_events.push_back(event).is_err() {
                            warn!("dropping event {:?}, deferred queue full", event);
                        }
                    }
                }
            }

            if self.tx_status.is_some() {
                break;
            }

            TIMER::delay_micros(1000);
        }

        match self.tx_status.take() {
            Some(TransmitStatus::Success) => {
                if transmit_type == TransmitType::Sop {
                    // The message ID wraps around.
                    let _ = self.message_id.increment();
                }
                Ok(())
            }
            Some(TransmitStatus::Discarded) => Err(TransmitError::Discarded),
            Some(TransmitStatus::Failed) => Err(TransmitError::Failed),
            None => {
                error!("PD transmit data timeout");
                Err(TransmitError::Timeout)
            }
        }
    }

    pub(super) fn transmit_hard_reset(&mut self) -> Result<(), TransmitError> {
        self.transmit(TransmitType::HardReset, None)
    }

    pub(super) fn send_control(&mut self, message_type: ControlMessageType) -> Result<(), TransmitError> {
        trace!("sending {:?}", message_type);
        let header = Header::new_control(self.header_template(), self.message_id, message_type);
        self.transmit(TransmitType::Sop, Some(&Message::new(header)))
    }

    fn send_data(&mut self, message_type: DataMessageType, data: Data, num_objects: usize) -> Result<(), TransmitError> {
        trace!("sending {:?} with {} objects", message_type, num_objects);
        let header = Header::new_data(self.header_template(), self.message_id, message_type, num_objects as u8);
        self.transmit(TransmitType::Sop, Some(&Message::new_with_data(header, data)))
    }

    /// Send our source capabilities, or reject, if there are none.
    pub(super) fn send_source_caps(&mut self) -> Result<(), TransmitError> {
        let pdos = self.config.source_pdos.clone();
        if pdos.is_empty() {
            return self.send_control(ControlMessageType::Reject);
        }

        let num_objects = pdos.len();
        self.send_data(
            DataMessageType::SourceCapabilities,
            Data::SourceCapabilities(pdos),
            num_objects,
        )
    }

    /// Send our sink capabilities, or reject, if there are none.
    pub(super) fn send_sink_caps(&mut self) -> Result<(), TransmitError> {
        let pdos = self.config.sink_pdos.clone();
        if pdos.is_empty() {
            return self.send_control(ControlMessageType::Reject);
        }

        let num_objects = pdos.len();
        self.send_data(DataMessageType::SinkCapabilities, Data::SinkCapabilities(pdos), num_objects)
    }

    /// Build a request from the partner's source capabilities, and send it.
    pub(super) fn send_request(&mut self) -> Result<(), Error> {
        let request = negotiator::build_request(
            &self.source_caps,
            &self.config.sink_pdos,
            self.config.operating_sink_milliwatt,
        )?;

        self.req_current_limit = request.current;
        self.req_supply_voltage = request.voltage;

        self.send_data(DataMessageType::Request, Data::Request(request.rdo), 1)?;
        Ok(())
    }

    pub(super) fn send_queued_message(&mut self, message: QueuedMessage) -> Result<(), TransmitError> {
        match message {
            QueuedMessage::Wait => self.send_control(ControlMessageType::Wait),
            QueuedMessage::Reject => self.send_control(ControlMessageType::Reject),
            QueuedMessage::NotSupported => self.send_control(ControlMessageType::NotSupported),
            QueuedMessage::SourceCapabilities => self.send_source_caps(),
            QueuedMessage::SinkCapabilities => self.send_sink_caps(),
        }
    }
}
