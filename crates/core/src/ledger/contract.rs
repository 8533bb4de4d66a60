//! `TicketSale` contract bindings.

alloy::sol! {
    /// `TicketSale` contract interface.
    #[sol(rpc)]
    interface ITicketSale {
        event TicketPurchased(address buyer, uint256 ticketId);
        event TicketReturned(address seller, uint256 ticketId, uint256 refundAmount);
        event SwapOfferCreated(address from, address to, uint256 fromTicketId, uint256 toTicketId);
        event SwapOfferAccepted(address from, address to, uint256 fromTicketId, uint256 toTicketId);

        /// Unit price of one ticket, in wei.
        function TICKET_PRICE() external view returns (uint256);

        /// Percentage of the price withheld on `returnTicket`.
        function RETURN_FEE_PERCENTAGE() external view returns (uint256);

        /// Number of tickets issued so far.
        function ticketCounter() external view returns (uint256);

        function tickets(uint256 ticketId) external view returns (address owner, bool isAvailable, uint256 price, bool exists);

        function swapOffers(uint256 index) external view returns (address from, address to, uint256 fromTicketId, uint256 toTicketId, bool isActive);

        function addressToTicket(address holder) external view returns (uint256);

        function getTicketNumberByAddress(address user) external view returns (uint256);

        function isTicketAvailable(uint256 ticketId) external view returns (bool);

        function purchaseTicket() external payable;

        function returnTicket(uint256 ticketId) external;

        function createSwapOffer(uint256 fromTicketId, uint256 toTicketId) external;

        function acceptSwapOffer(uint256 toTicketId) external;
    }
}
