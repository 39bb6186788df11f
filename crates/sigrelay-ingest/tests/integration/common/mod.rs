pub mod mock_telegram;
