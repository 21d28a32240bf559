pub mod api_message;
