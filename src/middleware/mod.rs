//! Request/reply middleware isolating wire protocols from engine logic.

mod channels;

pub use channels::{
    Channel, ChannelError, GenerationReply, GenerationStatusRequest, GeneratorAdminReceiver,
    StartGenerationRequest, StopGenerationRequest, TradingReplyReceiver, TradingRequestReceiver,
    TradingSessionEventReceiver, bind_generator_admin_receiver, bind_trading_reply_receiver,
    bind_trading_request_receiver, bind_trading_session_event_receiver, send_client_notification,
    send_generation_status, send_instrument_state_request, send_market_data_request,
    send_order_cancellation, send_order_modification, send_order_placement,
    send_security_status_request, send_session_terminated, send_start_generation,
    send_stop_generation, unbind_generator_admin_receiver, unbind_trading_reply_receiver,
    unbind_trading_request_receiver, unbind_trading_session_event_receiver,
};
